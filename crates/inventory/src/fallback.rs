//! Ingredient source fallback — ordered chain with per-source timeouts.
//!
//! When a source fails or times out, the next source in the chain is tried.
//! With the builtin snapshot as the last entry, an ingredient-source outage
//! is recovered locally instead of failing the request.

use async_trait::async_trait;
use menuforge_core::error::InventoryError;
use menuforge_core::{FilterSpec, Ingredient, IngredientSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A source that wraps an ordered list of sources and falls back on failure.
pub struct FallbackSource {
    name: String,
    chain: Vec<FallbackEntry>,
}

struct FallbackEntry {
    source: Arc<dyn IngredientSource>,
    timeout: Duration,
}

impl FallbackSource {
    /// Create a new fallback source with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), chain: Vec::new() }
    }

    /// Add a source to the chain with a custom timeout.
    pub fn add(mut self, source: Arc<dyn IngredientSource>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { source, timeout });
        self
    }

    /// Add a source with the default timeout (10s).
    pub fn add_default(self, source: Arc<dyn IngredientSource>) -> Self {
        self.add(source, Duration::from_secs(10))
    }

    /// Number of sources in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl IngredientSource for FallbackSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, spec: &FilterSpec) -> Result<Vec<Ingredient>, InventoryError> {
        let mut last_error = InventoryError::Unavailable("No sources in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let source_name = entry.source.name().to_string();

            info!(
                source = %source_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Inventory fallback: trying source"
            );

            match tokio::time::timeout(entry.timeout, entry.source.fetch(spec)).await {
                Ok(Ok(rows)) => return Ok(rows),
                Ok(Err(e)) => {
                    warn!(
                        source = %source_name,
                        error = %e,
                        "Inventory fallback: source failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        source = %source_name,
                        timeout_secs = entry.timeout.as_secs(),
                        "Inventory fallback: source timed out, trying next"
                    );
                    last_error = InventoryError::Unavailable(format!(
                        "Source '{}' timed out after {}s",
                        source_name,
                        entry.timeout.as_secs()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> Result<bool, InventoryError> {
        for entry in &self.chain {
            if let Ok(true) = entry.source.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
