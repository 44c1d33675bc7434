//! Stage collaborator traits — the LLM-backed contracts the orchestrator
//! sequences.
//!
//! Each trait wraps exactly one external text-generation call plus local,
//! bounded-time processing, so the orchestrator can abort between stages.
//! Collaborators are stateless across invocations; the only cross-stage
//! state is the [`PipelineState`](crate::PipelineState) the orchestrator owns.

use crate::error::{GenerationError, IntentError, InventoryError};
use crate::ingredient::Ingredient;
use crate::intent::Intent;
use crate::inventory::FilterSpec;
use crate::menu::Menu;
use crate::provider::Usage;
use crate::verdict::ValidationVerdict;
use async_trait::async_trait;

/// An extracted intent plus the token usage the extraction cost.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub intent: Intent,
    pub usage: Option<Usage>,
}

/// Turns a raw user query into structured intent.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> std::result::Result<Extraction, IntentError>;
}

/// Turns an intent into a structured ingredient filter.
///
/// Implementations may delegate to a text-to-query collaborator; a failure to
/// produce a spec should degrade to a deterministic fallback rather than fail
/// the request.
#[async_trait]
pub trait FilterSpecBuilder: Send + Sync {
    async fn build(&self, intent: &Intent) -> std::result::Result<FilterSpec, InventoryError>;
}

/// Inputs to initial menu generation.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInputs<'a> {
    pub intent: &'a Intent,
    pub ingredients: &'a [Ingredient],
    pub knowledge: &'a [String],
    pub previous_dishes: &'a [String],
}

/// Inputs to a menu repair round.
///
/// Carries only the single most recent verdict — the composer is stateless
/// across iterations; the iteration count lives with the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct AdjustInputs<'a> {
    pub menu: &'a Menu,
    pub verdict: &'a ValidationVerdict,
    pub intent: &'a Intent,
    pub ingredients: &'a [Ingredient],
}

/// A composed menu plus the token usage the composition cost.
#[derive(Debug, Clone)]
pub struct Composition {
    pub menu: Menu,
    pub usage: Option<Usage>,
}

/// Produces and repairs candidate menus.
#[async_trait]
pub trait MenuComposer: Send + Sync {
    /// Generate an initial candidate menu.
    async fn generate(
        &self,
        inputs: ComposeInputs<'_>,
    ) -> std::result::Result<Composition, GenerationError>;

    /// Repair a failing menu, moving the price in the direction the verdict
    /// indicates.
    async fn adjust(
        &self,
        inputs: AdjustInputs<'_>,
    ) -> std::result::Result<Composition, GenerationError>;
}
