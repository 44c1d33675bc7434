//! Ingredient domain types.
//!
//! An ingredient is a read-only inventory snapshot fetched once per request
//! from an external source; the pipeline never mutates it.

use serde::{Deserialize, Serialize};

/// Freshness ordinal: fresh > near-expiry > unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    NearExpiry,
    Unknown,
}

impl Freshness {
    /// Ordinal rank for prioritization — higher sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Freshness::Fresh => 2,
            Freshness::NearExpiry => 1,
            Freshness::Unknown => 0,
        }
    }

    /// Parse a stored freshness label; unrecognized labels are `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "fresh" => Freshness::Fresh,
            "near_expiry" | "near-expiry" => Freshness::NearExpiry,
            _ => Freshness::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::NearExpiry => "near_expiry",
            Freshness::Unknown => "unknown",
        }
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Freshness::Unknown
    }
}

/// One inventory row: an available ingredient with stock and unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name, unique within a snapshot.
    pub name: String,

    /// Available stock quantity, in `unit`s.
    pub quantity: f64,

    /// Stock unit (e.g., "g", "ml", "piece").
    pub unit: String,

    /// Freshness indicator.
    #[serde(default)]
    pub freshness: Freshness,

    /// Price per `unit`, in currency minor units.
    pub unit_price: f64,

    /// Inventory category (e.g., "vegetable", "protein", "spice").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_ordering_by_rank() {
        assert!(Freshness::Fresh.rank() > Freshness::NearExpiry.rank());
        assert!(Freshness::NearExpiry.rank() > Freshness::Unknown.rank());
    }

    #[test]
    fn freshness_parse_roundtrip() {
        for f in [Freshness::Fresh, Freshness::NearExpiry, Freshness::Unknown] {
            assert_eq!(Freshness::parse(f.as_str()), f);
        }
        assert_eq!(Freshness::parse("pickled"), Freshness::Unknown);
    }

    #[test]
    fn ingredient_deserializes_without_optional_fields() {
        let json = r#"{"name":"rice","quantity":5000.0,"unit":"g","unit_price":0.03}"#;
        let ing: Ingredient = serde_json::from_str(json).unwrap();
        assert_eq!(ing.freshness, Freshness::Unknown);
        assert!(ing.category.is_none());
    }
}
