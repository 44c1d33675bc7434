//! The response shape the pipeline exposes upward to the HTTP layer.

use crate::intent::MealType;
use crate::menu::MenuItem;
use crate::state::FailureReason;
use serde::{Deserialize, Serialize};

/// Terminal outcome of a suggest request, as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Fully validated menu.
    Success,
    /// The adjustment loop was exhausted; the last candidate was accepted.
    SuccessBestEffort,
    Failed,
}

/// Request-level accounting returned alongside the menu.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub elapsed_ms: u64,
    pub total_tokens: u32,
    pub adjustment_rounds: u32,
}

/// The full response to a `SuggestMenu` call.
///
/// Failures carry a stable reason code and no partial menu; degraded success
/// is a full response with `status = success_best_effort` so callers can
/// distinguish it from a fully validated menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub status: ResponseStatus,

    /// Stable failure reason code, present only when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default)]
    pub items: Vec<MenuItem>,

    pub total_price: f64,

    pub budget: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,

    #[serde(default)]
    pub meal_type: MealType,

    /// Human-readable rationale.
    pub message: String,

    #[serde(default)]
    pub metadata: ResponseMetadata,
}

impl MenuResponse {
    /// A failure response: stable reason code, no partial menu.
    pub fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.code().into()),
            items: Vec::new(),
            total_price: 0.0,
            budget: 0.0,
            cuisine: None,
            meal_type: MealType::Any,
            message: message.into(),
            metadata: ResponseMetadata::default(),
        }
    }
}
