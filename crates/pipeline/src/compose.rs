//! Menu composition — generation and repair via an external text-generation
//! collaborator.
//!
//! The composer's responsibilities are exactly: build the request payload
//! deterministically, parse the returned structure into a well-formed
//! [`Menu`], and reprice it from the candidate catalog rather than trusting
//! collaborator-supplied totals. One re-request is made on undecodable
//! output before the stage fails.

use crate::json::extract_json_object;
use crate::prompts;
use async_trait::async_trait;
use menuforge_core::error::GenerationError;
use menuforge_core::provider::{Message, Provider, ProviderRequest, Usage};
use menuforge_core::{
    AdjustInputs, ComposeInputs, Composition, DishCategory, Menu, MenuComposer, MenuIngredient,
    MenuItem,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Re-requests allowed when the collaborator returns undecodable output.
const MAX_PARSE_RETRIES: usize = 1;

/// LLM-backed menu composer.
pub struct LlmMenuComposer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmMenuComposer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: Some(4096),
        }
    }

    /// Set the max tokens per composition response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// One prompt → parsed menu round, with a bounded parse-failure retry.
    ///
    /// Provider errors are not retried here — rate limits and auth problems
    /// will not improve on a resend.
    async fn compose(&self, prompt: String, op: &'static str) -> Result<Composition, GenerationError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut usages: Vec<Usage> = Vec::new();
        let mut last_error = GenerationError::Unparseable("no attempts made".into());

        for attempt in 0..=MAX_PARSE_RETRIES {
            let response = self.provider.complete(request.clone()).await?;
            if let Some(usage) = response.usage {
                usages.push(usage);
            }

            match Self::parse_menu(&response.content) {
                Ok(menu) => {
                    debug!(op, attempt, items = menu.items.len(), "Menu parsed");
                    return Ok(Composition { menu, usage: sum_usage(&usages) });
                }
                Err(e) => {
                    warn!(op, attempt, error = %e, "Composer output rejected");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Decode and validate composer output into a [`Menu`].
    fn parse_menu(content: &str) -> Result<Menu, GenerationError> {
        let json = extract_json_object(content)
            .ok_or_else(|| GenerationError::Unparseable(snippet(content)))?;
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| GenerationError::Unparseable(e.to_string()))?;

        let raw_items = value
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| GenerationError::InvalidStructure("missing 'items' array".into()))?;

        let mut items = Vec::with_capacity(raw_items.len());
        for (i, raw) in raw_items.iter().enumerate() {
            items.push(Self::parse_item(i, raw)?);
        }

        Ok(Menu { items })
    }

    fn parse_item(index: usize, raw: &serde_json::Value) -> Result<MenuItem, GenerationError> {
        let name = raw
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GenerationError::InvalidStructure(format!("item {index} has no name")))?
            .to_string();

        let category = raw
            .get("category")
            .and_then(|v| v.as_str())
            .map(DishCategory::from_tag)
            .unwrap_or_default();

        let mut ingredients = Vec::new();
        if let Some(lines) = raw.get("ingredients").and_then(|v| v.as_array()) {
            for (j, line) in lines.iter().enumerate() {
                let line_name = line
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        GenerationError::InvalidStructure(format!(
                            "item {index} ingredient {j} has no name"
                        ))
                    })?
                    .to_string();

                let quantity = line.get("quantity").and_then(|v| v.as_f64()).ok_or_else(|| {
                    GenerationError::InvalidStructure(format!(
                        "item {index} ingredient '{line_name}' has no quantity"
                    ))
                })?;
                if quantity < 0.0 {
                    return Err(GenerationError::InvalidStructure(format!(
                        "item {index} ingredient '{line_name}' has negative quantity"
                    )));
                }

                let price = line.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0);
                if price < 0.0 {
                    return Err(GenerationError::InvalidStructure(format!(
                        "item {index} ingredient '{line_name}' has negative price"
                    )));
                }

                ingredients.push(MenuIngredient {
                    name: line_name,
                    quantity,
                    unit: line
                        .get("unit")
                        .and_then(|v| v.as_str())
                        .unwrap_or("g")
                        .to_string(),
                    price,
                });
            }
        }

        let price = match raw.get("price").and_then(|v| v.as_f64()) {
            Some(p) if p < 0.0 => {
                return Err(GenerationError::InvalidStructure(format!(
                    "item {index} ('{name}') has negative price"
                )))
            }
            Some(p) => p,
            None if ingredients.is_empty() => {
                return Err(GenerationError::InvalidStructure(format!(
                    "item {index} ('{name}') has neither price nor ingredients"
                )))
            }
            // Recomputed from the lines during repricing.
            None => 0.0,
        };

        Ok(MenuItem { name, category, ingredients, price })
    }
}

fn sum_usage(usages: &[Usage]) -> Option<Usage> {
    if usages.is_empty() {
        return None;
    }
    Some(usages.iter().fold(Usage::default(), |acc, u| Usage {
        prompt_tokens: acc.prompt_tokens + u.prompt_tokens,
        completion_tokens: acc.completion_tokens + u.completion_tokens,
        total_tokens: acc.total_tokens + u.total_tokens,
    }))
}

fn snippet(content: &str) -> String {
    content.chars().take(200).collect()
}

#[async_trait]
impl MenuComposer for LlmMenuComposer {
    async fn generate(&self, inputs: ComposeInputs<'_>) -> Result<Composition, GenerationError> {
        let prompt = prompts::generate_menu_prompt(&inputs);
        let mut composition = self.compose(prompt, "generate_menu").await?;
        composition.menu.reprice(inputs.ingredients);

        info!(
            items = composition.menu.items.len(),
            total = composition.menu.total_price(),
            "Menu generated"
        );
        Ok(composition)
    }

    async fn adjust(&self, inputs: AdjustInputs<'_>) -> Result<Composition, GenerationError> {
        let prompt = prompts::adjust_menu_prompt(&inputs);
        let mut composition = self.compose(prompt, "adjust_menu").await?;
        composition.menu.reprice(inputs.ingredients);

        info!(
            items = composition.menu.items.len(),
            total = composition.menu.total_price(),
            "Menu adjusted"
        );
        Ok(composition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_intent, ScriptedProvider};
    use menuforge_core::{Freshness, Ingredient};

    const VALID_MENU: &str = r#"{
        "items": [
            {
                "name": "Bibimbap",
                "category": "main",
                "ingredients": [
                    {"name": "jasmine rice", "quantity": 400, "unit": "g", "price": 10000},
                    {"name": "chicken breast", "quantity": 300, "unit": "g", "price": 27000}
                ],
                "price": 37000
            }
        ]
    }"#;

    fn catalog() -> Vec<Ingredient> {
        vec![
            Ingredient {
                name: "jasmine rice".into(),
                quantity: 10_000.0,
                unit: "g".into(),
                freshness: Freshness::Unknown,
                unit_price: 25.0,
                category: Some("staple".into()),
            },
            Ingredient {
                name: "chicken breast".into(),
                quantity: 3000.0,
                unit: "g".into(),
                freshness: Freshness::Fresh,
                unit_price: 90.0,
                category: Some("protein".into()),
            },
        ]
    }

    fn composer(responses: Vec<&str>) -> (LlmMenuComposer, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(responses));
        (LlmMenuComposer::new(provider.clone(), "mock-model", 0.7), provider)
    }

    #[tokio::test]
    async fn generate_parses_and_reprices_from_catalog() {
        let (composer, provider) = composer(vec![VALID_MENU]);
        let intent = test_intent();
        let catalog = catalog();
        let inputs = ComposeInputs {
            intent: &intent,
            ingredients: &catalog,
            knowledge: &[],
            previous_dishes: &[],
        };

        let composition = composer.generate(inputs).await.unwrap();
        let menu = composition.menu;
        // Catalog prices win: rice 400×25 + chicken 300×90
        assert_eq!(menu.items[0].ingredients[0].price, 10_000.0);
        assert_eq!(menu.items[0].ingredients[1].price, 27_000.0);
        assert_eq!(menu.total_price(), 37_000.0);
        assert_eq!(provider.call_count(), 1);
        assert!(composition.usage.is_some());
    }

    #[tokio::test]
    async fn undecodable_output_is_retried_once() {
        let (composer, provider) = composer(vec!["Sorry, I can't do JSON today.", VALID_MENU]);
        let intent = test_intent();
        let inputs = ComposeInputs {
            intent: &intent,
            ingredients: &[],
            knowledge: &[],
            previous_dishes: &[],
        };

        let composition = composer.generate(inputs).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(composition.menu.items.len(), 1);
        // Usage from both attempts is accounted for.
        assert_eq!(composition.usage.unwrap().total_tokens, 30);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_stage() {
        let (composer, provider) = composer(vec!["garbage", "more garbage"]);
        let intent = test_intent();
        let inputs = ComposeInputs {
            intent: &intent,
            ingredients: &[],
            knowledge: &[],
            previous_dishes: &[],
        };

        let result = composer.generate(inputs).await;
        assert!(matches!(result, Err(GenerationError::Unparseable(_))));
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn parse_rejects_missing_items() {
        let err = LlmMenuComposer::parse_menu(r#"{"menu": []}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidStructure(_)));
    }

    #[test]
    fn parse_rejects_unnamed_item() {
        let err = LlmMenuComposer::parse_menu(r#"{"items": [{"price": 100}]}"#).unwrap_err();
        assert!(err.to_string().contains("no name"));
    }

    #[test]
    fn parse_rejects_missing_ingredient_quantity() {
        let raw = r#"{"items": [{"name": "Soup", "ingredients": [{"name": "water"}], "price": 0}]}"#;
        let err = LlmMenuComposer::parse_menu(raw).unwrap_err();
        assert!(err.to_string().contains("no quantity"));
    }

    #[test]
    fn parse_rejects_negative_price() {
        let raw = r#"{"items": [{"name": "Refund special", "price": -5}]}"#;
        let err = LlmMenuComposer::parse_menu(raw).unwrap_err();
        assert!(err.to_string().contains("negative price"));
    }

    #[test]
    fn parse_rejects_item_with_no_price_and_no_ingredients() {
        let raw = r#"{"items": [{"name": "Mystery dish"}]}"#;
        let err = LlmMenuComposer::parse_menu(raw).unwrap_err();
        assert!(err.to_string().contains("neither price nor ingredients"));
    }

    #[test]
    fn parse_accepts_empty_items() {
        let menu = LlmMenuComposer::parse_menu(r#"{"items": []}"#).unwrap();
        assert!(menu.items.is_empty());
        assert_eq!(menu.total_price(), 0.0);
    }

    #[test]
    fn parse_normalizes_categories() {
        let raw = r#"{"items": [
            {"name": "Kimchi stew", "category": "stew", "price": 40000},
            {"name": "Rice", "category": "weird", "price": 10000}
        ]}"#;
        let menu = LlmMenuComposer::parse_menu(raw).unwrap();
        assert_eq!(menu.items[0].category, DishCategory::Soup);
        assert_eq!(menu.items[1].category, DishCategory::Other);
    }
}
