//! Pipeline state — the single mutable object threaded through all stages.
//!
//! Each request gets its own instance; no state is shared across concurrent
//! requests, so the pipeline itself needs no locking. Once the terminal
//! status is set, no stage may mutate the state further — the orchestrator
//! owns the state for exactly one request.

use crate::ingredient::Ingredient;
use crate::intent::Intent;
use crate::menu::Menu;
use crate::provider::Usage;
use crate::verdict::ValidationVerdict;
use serde::{Deserialize, Serialize};

/// Why a request failed. Codes are stable and user-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Stage 1 could not produce a usable intent.
    IntentParse,
    /// The ingredient source (and any fallback) was unavailable.
    IngredientSource,
    /// Generation could not produce a parseable menu.
    MenuGeneration,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::IntentParse => "intent_parse_error",
            FailureReason::IngredientSource => "ingredient_source_error",
            FailureReason::MenuGeneration => "menu_generation_error",
        }
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    InProgress,
    /// Validated menu within the budget window.
    Success,
    /// Adjustment ceiling reached; the last candidate menu was accepted as-is.
    BestEffort,
    Failed(FailureReason),
}

/// Token usage attributed to one LLM-backed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageUsage {
    pub stage: String,
    pub usage: Usage,
}

/// The pipeline state threaded from stage to stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// The raw user query.
    pub query: String,

    /// Dishes recently suggested to this user (empty when untracked).
    #[serde(default)]
    pub previous_dishes: Vec<String>,

    /// Extracted intent; set by ParseIntent.
    pub intent: Option<Intent>,

    /// Candidate ingredients; filled by QueryIngredients, narrowed by
    /// PrefilterIngredients.
    #[serde(default)]
    pub candidates: Vec<Ingredient>,

    /// Retrieved knowledge snippets; filled by RetrieveAndGenerate.
    #[serde(default)]
    pub knowledge: Vec<String>,

    /// Current candidate menu; set by RetrieveAndGenerate, replaced by
    /// AdjustMenu.
    pub menu: Option<Menu>,

    /// Most recent validation verdict.
    pub verdict: Option<ValidationVerdict>,

    /// How many adjustment rounds have run.
    pub iterations: u32,

    /// Terminal status.
    pub status: PipelineStatus,

    /// Per-stage token usage.
    #[serde(default)]
    pub usage: Vec<StageUsage>,
}

impl PipelineState {
    pub fn new(query: impl Into<String>, previous_dishes: Vec<String>) -> Self {
        Self {
            query: query.into(),
            previous_dishes,
            intent: None,
            candidates: Vec::new(),
            knowledge: Vec::new(),
            menu: None,
            verdict: None,
            iterations: 0,
            status: PipelineStatus::InProgress,
            usage: Vec::new(),
        }
    }

    /// Whether the run has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, PipelineStatus::InProgress)
    }

    /// Attribute token usage to a stage, when the collaborator reported any.
    pub fn record_usage(&mut self, stage: &str, usage: Option<Usage>) {
        if let Some(usage) = usage {
            self.usage.push(StageUsage { stage: stage.into(), usage });
        }
    }

    /// Total tokens spent across all recorded stages.
    pub fn total_tokens(&self) -> u32 {
        self.usage.iter().map(|s| s.usage.total_tokens).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_codes_are_stable() {
        assert_eq!(FailureReason::IntentParse.code(), "intent_parse_error");
        assert_eq!(FailureReason::IngredientSource.code(), "ingredient_source_error");
        assert_eq!(FailureReason::MenuGeneration.code(), "menu_generation_error");
    }

    #[test]
    fn fresh_state_is_not_terminal() {
        let state = PipelineState::new("lunch for two", vec![]);
        assert!(!state.is_terminal());
        assert_eq!(state.iterations, 0);
    }

    #[test]
    fn terminal_states() {
        let mut state = PipelineState::new("q", vec![]);
        state.status = PipelineStatus::Success;
        assert!(state.is_terminal());
        state.status = PipelineStatus::Failed(FailureReason::MenuGeneration);
        assert!(state.is_terminal());
    }

    #[test]
    fn usage_accumulates_across_stages() {
        let mut state = PipelineState::new("q", vec![]);
        state.record_usage(
            "parse_intent",
            Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
        );
        state.record_usage("retrieve", None);
        state.record_usage(
            "generate_menu",
            Some(Usage { prompt_tokens: 100, completion_tokens: 50, total_tokens: 150 }),
        );
        assert_eq!(state.usage.len(), 2);
        assert_eq!(state.total_tokens(), 165);
    }
}
