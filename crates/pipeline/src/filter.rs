//! Ingredient filtering — stages 2 and 3 of the pipeline.
//!
//! The filter spec narrows the inventory at the source; the prefilter then
//! orders the survivors by freshness and truncates them to a bounded
//! candidate set so the generator's context stays small.

use crate::json::extract_json_object;
use crate::prompts;
use async_trait::async_trait;
use menuforge_core::error::InventoryError;
use menuforge_core::provider::{Message, Provider, ProviderRequest};
use menuforge_core::{FilterSpec, FilterSpecBuilder, Ingredient, Intent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Hard cap on the candidate set handed to the generator.
pub const MAX_CANDIDATES: usize = 50;

/// Order candidates by freshness (fresher first) and truncate to
/// [`MAX_CANDIDATES`].
///
/// The sort is stable, so ingredients of equal freshness keep their inventory
/// order — the whole operation is deterministic for a given input order.
pub fn prefilter(mut candidates: Vec<Ingredient>) -> Vec<Ingredient> {
    candidates.sort_by_key(|ing| std::cmp::Reverse(ing.freshness.rank()));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// Deterministic filter spec used when the LLM cannot produce one.
///
/// Only the basics: a price ceiling at the whole budget and no seasonings.
/// Preference handling is the LLM's job and is skipped here.
pub fn fallback_spec(intent: &Intent) -> FilterSpec {
    FilterSpec {
        max_unit_price: (intent.budget > 0.0).then_some(intent.budget),
        exclude_categories: vec!["spice".into()],
        ..Default::default()
    }
}

/// LLM-backed filter spec builder.
///
/// Delegates predicate construction to a text-to-query call; any failure
/// degrades to [`fallback_spec`] rather than failing the request.
pub struct LlmFilterSpecBuilder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl LlmFilterSpecBuilder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }

    async fn build_via_llm(&self, intent: &Intent) -> Option<FilterSpec> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompts::filter_spec_prompt(intent))],
            temperature: 0.2,
            max_tokens: Some(512),
        };

        let response = match self.provider.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Filter spec generation failed, using fallback");
                return None;
            }
        };

        let json = extract_json_object(&response.content)?;
        match serde_json::from_str::<FilterSpec>(json) {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(error = %e, "Filter spec undecodable, using fallback");
                None
            }
        }
    }
}

#[async_trait]
impl FilterSpecBuilder for LlmFilterSpecBuilder {
    async fn build(&self, intent: &Intent) -> Result<FilterSpec, InventoryError> {
        let spec = match self.build_via_llm(intent).await {
            Some(spec) => spec,
            None => fallback_spec(intent),
        };
        debug!(?spec, "Filter spec built");
        Ok(spec)
    }
}
