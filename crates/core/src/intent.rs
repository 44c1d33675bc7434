//! Structured intent — what the user actually asked for.
//!
//! Extracted from free text by an external text-generation collaborator and
//! validated into this shape before any downstream stage runs.

use serde::{Deserialize, Serialize};

/// The meal the menu is for.
///
/// Free-text meal tags from the extractor are normalized via [`MealType::from_tag`];
/// anything unrecognized maps to [`MealType::Any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Any,
}

impl MealType {
    /// Normalize a free-text meal tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "breakfast" | "brunch" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" | "supper" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Any,
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Any => "any",
        };
        write!(f, "{s}")
    }
}

impl Default for MealType {
    fn default() -> Self {
        MealType::Any
    }
}

/// Structured extraction of budget, party size, preferences, and meal type.
///
/// Invariants (enforced at the extraction boundary):
/// - `budget` is a positive amount before validation runs; when the user named
///   no budget, a configured default has already been substituted and
///   `budget_specified` is false.
/// - `people >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Budget in currency minor units (e.g., VND).
    pub budget: f64,

    /// Whether the user actually named a budget, or the default policy applied.
    pub budget_specified: bool,

    /// Number of people eating.
    pub people: u32,

    /// Detected cuisine, when the query names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    /// Dietary preferences and requests, verbatim.
    #[serde(default)]
    pub preferences: Vec<String>,

    /// Which meal the menu is for.
    #[serde(default)]
    pub meal_type: MealType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_normalization() {
        assert_eq!(MealType::from_tag("Lunch"), MealType::Lunch);
        assert_eq!(MealType::from_tag(" dinner "), MealType::Dinner);
        assert_eq!(MealType::from_tag("supper"), MealType::Dinner);
        assert_eq!(MealType::from_tag("midnight feast"), MealType::Any);
    }

    #[test]
    fn meal_type_serde_lowercase() {
        let json = serde_json::to_string(&MealType::Breakfast).unwrap();
        assert_eq!(json, "\"breakfast\"");
    }

    #[test]
    fn intent_round_trip() {
        let intent = Intent {
            budget: 200_000.0,
            budget_specified: true,
            people: 2,
            cuisine: Some("Korean".into()),
            preferences: vec!["no seafood".into()],
            meal_type: MealType::Lunch,
        };
        let json = serde_json::to_string(&intent).unwrap();
        let back: Intent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.people, 2);
        assert_eq!(back.cuisine.as_deref(), Some("Korean"));
        assert_eq!(back.meal_type, MealType::Lunch);
    }
}
