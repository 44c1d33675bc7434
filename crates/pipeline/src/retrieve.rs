//! Deterministic retrieval-query construction for the knowledge stage.

use menuforge_core::Intent;

/// How many ingredient names are folded into the query text.
const MAX_QUERY_INGREDIENTS: usize = 5;

/// Build the retrieval query string from an intent and the candidate
/// ingredient names.
///
/// The construction is deterministic: the same intent and candidate order
/// always produce the same query, so identical requests retrieve identical
/// context.
pub fn build_retrieval_query(intent: &Intent, ingredient_names: &[String]) -> String {
    let cuisine = intent.cuisine.as_deref().unwrap_or("everyday");
    let mut query = format!(
        "{cuisine} cuisine dish and ingredient pairing rules for {} meals",
        intent.meal_type
    );

    if !ingredient_names.is_empty() {
        let names = ingredient_names
            .iter()
            .take(MAX_QUERY_INGREDIENTS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        query.push_str(&format!(" using ingredients: {names}"));
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_intent;

    #[test]
    fn query_names_cuisine_and_meal() {
        let q = build_retrieval_query(&test_intent(), &[]);
        assert!(q.contains("Korean"));
        assert!(q.contains("lunch"));
        assert!(!q.contains("ingredients:"));
    }

    #[test]
    fn missing_cuisine_falls_back_to_everyday() {
        let mut intent = test_intent();
        intent.cuisine = None;
        let q = build_retrieval_query(&intent, &[]);
        assert!(q.contains("everyday"));
    }

    #[test]
    fn query_caps_ingredient_names_at_five() {
        let names: Vec<String> = (0..8).map(|i| format!("ingredient{i}")).collect();
        let q = build_retrieval_query(&test_intent(), &names);
        assert!(q.contains("ingredient4"));
        assert!(!q.contains("ingredient5"));
    }

    #[test]
    fn query_is_deterministic() {
        let names = vec!["rice".to_string(), "tofu".to_string()];
        let a = build_retrieval_query(&test_intent(), &names);
        let b = build_retrieval_query(&test_intent(), &names);
        assert_eq!(a, b);
    }
}
