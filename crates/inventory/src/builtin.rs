//! Built-in snapshot source.
//!
//! Serves an inventory snapshot embedded at compile time. This is the defined
//! fallback source: it cannot be unavailable, so a fallback chain ending here
//! always recovers an ingredient-source outage locally.

use async_trait::async_trait;
use menuforge_core::error::InventoryError;
use menuforge_core::{FilterSpec, Ingredient, IngredientSource};
use std::sync::OnceLock;
use tracing::debug;

const SNAPSHOT: &str = include_str!("../data/ingredients.json");

fn snapshot() -> &'static [Ingredient] {
    static ROWS: OnceLock<Vec<Ingredient>> = OnceLock::new();
    ROWS.get_or_init(|| {
        serde_json::from_str(SNAPSHOT).expect("embedded ingredient snapshot is valid JSON")
    })
}

/// The embedded inventory snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl BuiltinSource {
    pub fn new() -> Self {
        Self
    }

    /// Number of rows in the snapshot.
    pub fn len(&self) -> usize {
        snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        snapshot().is_empty()
    }
}

#[async_trait]
impl IngredientSource for BuiltinSource {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn fetch(&self, spec: &FilterSpec) -> Result<Vec<Ingredient>, InventoryError> {
        let rows: Vec<Ingredient> = snapshot()
            .iter()
            .filter(|ing| spec.matches(ing))
            .cloned()
            .collect();
        debug!(total = snapshot().len(), matched = rows.len(), "Builtin snapshot filtered");
        Ok(rows)
    }
}
