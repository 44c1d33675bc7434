//! Ingredient source trait and the structured filter spec.
//!
//! A `FilterSpec` is the intent-derived narrowing applied to the full
//! inventory before it reaches the generator. The spec is structured rather
//! than a query-language fragment so every source can apply it natively: the
//! SQLite backend compiles it into a WHERE clause, in-process sources apply
//! it as a predicate.

use crate::error::InventoryError;
use crate::ingredient::Ingredient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured ingredient filter derived from an [`Intent`](crate::Intent).
///
/// All string matching is case-insensitive substring matching. An empty spec
/// matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Exclude ingredients priced above this per-unit ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unit_price: Option<f64>,

    /// When non-empty, only these categories are allowed.
    #[serde(default)]
    pub include_categories: Vec<String>,

    /// Categories to exclude (applied after includes).
    #[serde(default)]
    pub exclude_categories: Vec<String>,

    /// When non-empty, the name must contain at least one of these terms.
    #[serde(default)]
    pub name_contains: Vec<String>,

    /// The name must contain none of these terms.
    #[serde(default)]
    pub name_excludes: Vec<String>,
}

impl FilterSpec {
    /// A spec that matches the whole inventory.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Whether this spec places no constraints at all.
    pub fn is_empty(&self) -> bool {
        self.max_unit_price.is_none()
            && self.include_categories.is_empty()
            && self.exclude_categories.is_empty()
            && self.name_contains.is_empty()
            && self.name_excludes.is_empty()
    }

    /// Apply the spec to a single ingredient.
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        if let Some(ceiling) = self.max_unit_price {
            if ingredient.unit_price > ceiling {
                return false;
            }
        }

        let category = ingredient
            .category
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        if !self.include_categories.is_empty()
            && !self
                .include_categories
                .iter()
                .any(|c| category == c.to_lowercase())
        {
            return false;
        }

        if self
            .exclude_categories
            .iter()
            .any(|c| category == c.to_lowercase())
        {
            return false;
        }

        let name = ingredient.name.to_lowercase();

        if !self.name_contains.is_empty()
            && !self
                .name_contains
                .iter()
                .any(|t| name.contains(&t.to_lowercase()))
        {
            return false;
        }

        if self
            .name_excludes
            .iter()
            .any(|t| name.contains(&t.to_lowercase()))
        {
            return false;
        }

        true
    }
}

/// An external ingredient inventory.
///
/// Sources return a read-only snapshot already narrowed by the spec; order is
/// the source's stable inventory order. An empty result is valid.
#[async_trait]
pub trait IngredientSource: Send + Sync {
    /// A human-readable name for this source (e.g., "sqlite", "builtin").
    fn name(&self) -> &str;

    /// Fetch the ingredients matching the spec.
    async fn fetch(&self, spec: &FilterSpec) -> std::result::Result<Vec<Ingredient>, InventoryError>;

    /// Health check — can we reach the source?
    async fn health_check(&self) -> std::result::Result<bool, InventoryError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::Freshness;

    fn ing(name: &str, category: &str, unit_price: f64) -> Ingredient {
        Ingredient {
            name: name.into(),
            quantity: 1000.0,
            unit: "g".into(),
            freshness: Freshness::Fresh,
            unit_price,
            category: Some(category.into()),
        }
    }

    #[test]
    fn match_all_matches_everything() {
        let spec = FilterSpec::match_all();
        assert!(spec.is_empty());
        assert!(spec.matches(&ing("tofu", "protein", 0.5)));
    }

    #[test]
    fn price_ceiling_excludes_expensive() {
        let spec = FilterSpec { max_unit_price: Some(1.0), ..Default::default() };
        assert!(spec.matches(&ing("rice", "staple", 0.03)));
        assert!(!spec.matches(&ing("saffron", "spice", 500.0)));
    }

    #[test]
    fn category_include_and_exclude() {
        let spec = FilterSpec {
            include_categories: vec!["protein".into(), "vegetable".into()],
            exclude_categories: vec!["spice".into()],
            ..Default::default()
        };
        assert!(spec.matches(&ing("chicken breast", "Protein", 0.2)));
        assert!(!spec.matches(&ing("basil", "herb", 0.1)));
        assert!(!spec.matches(&ing("chili flakes", "spice", 0.1)));
    }

    #[test]
    fn name_terms_are_case_insensitive_substrings() {
        let spec = FilterSpec {
            name_contains: vec!["egg".into()],
            name_excludes: vec!["quail".into()],
            ..Default::default()
        };
        assert!(spec.matches(&ing("Chicken Egg", "protein", 0.3)));
        assert!(!spec.matches(&ing("Quail egg", "protein", 0.8)));
        assert!(!spec.matches(&ing("tofu", "protein", 0.5)));
    }
}
