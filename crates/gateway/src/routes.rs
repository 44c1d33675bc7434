//! The suggest endpoint.

use crate::SharedState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use menuforge_core::{MenuResponse, ResponseStatus};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Request body for `POST /v1/menu/suggest`.
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    /// The natural-language meal request (e.g. "lunch for 2 people, 200k").
    pub query: String,

    /// Optional stable user identifier; enables dish-history tracking so
    /// repeat requests get varied suggestions.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `POST /v1/menu/suggest` — run the suggestion pipeline for one query.
///
/// Success and best-effort outcomes return 200 with the full menu; pipeline
/// failures return the structured failure body with a stable reason code —
/// 422 when the request itself was not understandable, 502 when an upstream
/// collaborator could not deliver.
pub async fn suggest_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SuggestRequest>,
) -> (StatusCode, Json<MenuResponse>) {
    let request_id = Uuid::new_v4();
    let query = payload.query.trim();

    if query.is_empty() {
        warn!(%request_id, "Rejected empty query");
        let response = MenuResponse {
            reason: Some("empty_query".into()),
            ..MenuResponse::failed(menuforge_core::FailureReason::IntentParse, "Query is required")
        };
        return (StatusCode::BAD_REQUEST, Json(response));
    }

    let user_id = payload.user_id.as_deref().unwrap_or_default();
    let previous_dishes = state.history.recent(user_id).await;

    info!(
        %request_id,
        query_len = query.len(),
        tracked_user = !user_id.is_empty(),
        previous_dishes = previous_dishes.len(),
        "Suggest request received"
    );

    let response = state.orchestrator.suggest(query, previous_dishes).await;

    match response.status {
        ResponseStatus::Success | ResponseStatus::SuccessBestEffort => {
            if !user_id.is_empty() {
                let names: Vec<String> =
                    response.items.iter().map(|item| item.name.clone()).collect();
                state.history.record(user_id, &names).await;
            }
            (StatusCode::OK, Json(response))
        }
        ResponseStatus::Failed => {
            warn!(
                %request_id,
                reason = response.reason.as_deref().unwrap_or("unknown"),
                "Suggest request failed"
            );
            let status = match response.reason.as_deref() {
                Some("intent_parse_error") => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Json(response))
        }
    }
}
