//! Gateway endpoint handler — forwards the prompt through the orchestrator
//! and maps gateway errors onto HTTP status codes.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use arbiter_llm::orchestrator::{GatewayError, LlmApiRequest};

use crate::state::SharedState;

/// POST /api/llm — body `{ prompt: string, userId?: string }`.
///
/// 200 with the merged completion + evaluation payload, 400 on a missing or
/// invalid prompt, 500 (with the request id) when the primary call fails.
pub async fn llm_submit(
    State(state): State<SharedState>,
    Json(payload): Json<LlmApiRequest>,
) -> Response {
    match state.orchestrator.handle(payload).await {
        Ok(reply) => Json(reply).into_response(),
        Err(GatewayError::InvalidPrompt(message)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        Err(GatewayError::Provider { request_id, message }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message, "requestId": request_id })),
        )
            .into_response(),
    }
}
