//! Intent extraction — stage 1 of the pipeline.
//!
//! Wraps one external text-generation call behind a strict parse boundary:
//! the extractor either produces a validated [`Intent`] or the request fails
//! with an intent-parse error. No untyped data leaves this stage.

use crate::json::extract_json_object;
use crate::prompts;
use async_trait::async_trait;
use menuforge_core::error::IntentError;
use menuforge_core::provider::{Message, Provider, ProviderRequest};
use menuforge_core::{Extraction, Intent, IntentExtractor, MealType};
use std::sync::Arc;
use tracing::{debug, info};

/// What to assume when the user names no budget.
///
/// A query whose extracted JSON lacks the budget key entirely is an error
/// (the extractor contract always emits the key); an explicit `null` means
/// "no budget named" and gets `default_per_person × people` substituted.
#[derive(Debug, Clone, Copy)]
pub struct BudgetPolicy {
    pub default_per_person: f64,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self { default_per_person: 60_000.0 }
    }
}

/// LLM-backed intent extractor.
pub struct LlmIntentExtractor {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    policy: BudgetPolicy,
}

impl LlmIntentExtractor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, policy: BudgetPolicy) -> Self {
        Self {
            provider,
            model: model.into(),
            // Extraction wants faithful parsing, not creativity.
            temperature: 0.2,
            policy,
        }
    }

    /// Decode and validate the extractor's JSON into an [`Intent`].
    fn parse_intent(&self, content: &str) -> Result<Intent, IntentError> {
        let json = extract_json_object(content)
            .ok_or_else(|| IntentError::Unparseable(snippet(content)))?;
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| IntentError::Unparseable(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| IntentError::Unparseable("not a JSON object".into()))?;

        let people = object
            .get("num_people")
            .and_then(|v| v.as_u64())
            .unwrap_or(1)
            .max(1) as u32;

        // Absent key: the contract was violated. Explicit null: the user
        // named no budget and the default policy applies.
        let (budget, budget_specified) = match object.get("budget") {
            None => return Err(IntentError::MissingBudget),
            Some(serde_json::Value::Null) => {
                (self.policy.default_per_person * f64::from(people), false)
            }
            Some(v) => {
                let amount = v.as_f64().ok_or_else(|| {
                    IntentError::Unparseable(format!("budget is not numeric: {v}"))
                })?;
                if amount < 0.0 {
                    return Err(IntentError::Unparseable(format!("budget is negative: {amount}")));
                }
                (amount, true)
            }
        };

        let cuisine = object
            .get("cuisine")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let preferences = object
            .get("preferences")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let meal_type = object
            .get("meal_type")
            .and_then(|v| v.as_str())
            .map(MealType::from_tag)
            .unwrap_or_default();

        Ok(Intent { budget, budget_specified, people, cuisine, preferences, meal_type })
    }
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract(&self, query: &str) -> Result<Extraction, IntentError> {
        debug!(query_len = query.len(), "Extracting intent");

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompts::parse_intent_prompt(query))],
            temperature: self.temperature,
            max_tokens: Some(512),
        };

        let response = self.provider.complete(request).await?;
        let intent = self.parse_intent(&response.content)?;

        info!(
            budget = intent.budget,
            budget_specified = intent.budget_specified,
            people = intent.people,
            cuisine = intent.cuisine.as_deref().unwrap_or("-"),
            "Intent extracted"
        );

        Ok(Extraction { intent, usage: response.usage })
    }
}

fn snippet(content: &str) -> String {
    content.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn extractor(responses: Vec<&str>) -> LlmIntentExtractor {
        LlmIntentExtractor::new(
            Arc::new(ScriptedProvider::new(responses)),
            "mock-model",
            BudgetPolicy::default(),
        )
    }

    #[tokio::test]
    async fn extracts_full_intent() {
        let extractor = extractor(vec![
            r#"{"budget": 200000, "num_people": 2, "cuisine": "Korean", "preferences": ["no seafood"], "meal_type": "lunch"}"#,
        ]);
        let extraction = extractor.extract("Korean lunch for 2, 200k").await.unwrap();
        let intent = extraction.intent;
        assert_eq!(intent.budget, 200_000.0);
        assert!(intent.budget_specified);
        assert_eq!(intent.people, 2);
        assert_eq!(intent.cuisine.as_deref(), Some("Korean"));
        assert_eq!(intent.meal_type, MealType::Lunch);
        assert!(extraction.usage.is_some());
    }

    #[tokio::test]
    async fn accepts_markdown_fenced_output() {
        let extractor = extractor(vec![
            "Here you go:\n```json\n{\"budget\": 150000, \"num_people\": 1}\n```",
        ]);
        let extraction = extractor.extract("dinner, 150k").await.unwrap();
        assert_eq!(extraction.intent.budget, 150_000.0);
        assert_eq!(extraction.intent.people, 1);
        assert_eq!(extraction.intent.meal_type, MealType::Any);
    }

    #[tokio::test]
    async fn null_budget_applies_default_policy() {
        let extractor = extractor(vec![r#"{"budget": null, "num_people": 3}"#]);
        let extraction = extractor.extract("dinner for 3").await.unwrap();
        assert!(!extraction.intent.budget_specified);
        assert_eq!(extraction.intent.budget, 180_000.0); // 60k per person × 3
    }

    #[tokio::test]
    async fn missing_budget_key_is_an_error() {
        let extractor = extractor(vec![r#"{"num_people": 2}"#]);
        let result = extractor.extract("lunch for two").await;
        assert!(matches!(result, Err(IntentError::MissingBudget)));
    }

    #[tokio::test]
    async fn non_numeric_budget_is_an_error() {
        let extractor = extractor(vec![r#"{"budget": "cheap", "num_people": 2}"#]);
        assert!(matches!(
            extractor.extract("cheap lunch").await,
            Err(IntentError::Unparseable(_))
        ));
    }

    #[tokio::test]
    async fn negative_budget_is_an_error() {
        let extractor = extractor(vec![r#"{"budget": -5, "num_people": 2}"#]);
        assert!(matches!(
            extractor.extract("lunch").await,
            Err(IntentError::Unparseable(_))
        ));
    }

    #[tokio::test]
    async fn prose_without_json_is_an_error() {
        let extractor = extractor(vec!["I'd be happy to help you plan lunch!"]);
        assert!(matches!(
            extractor.extract("lunch").await,
            Err(IntentError::Unparseable(_))
        ));
    }

    #[tokio::test]
    async fn zero_people_clamped_to_one() {
        let extractor = extractor(vec![r#"{"budget": 100000, "num_people": 0}"#]);
        let extraction = extractor.extract("solo snack").await.unwrap();
        assert_eq!(extraction.intent.people, 1);
    }
}
