//! Workflow engine callback handler.

use axum::Json;
use axum::extract::State;

use forma_dispatch::callback::CallbackDisposition;
use forma_dispatch::types::CallbackPayload;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/callbacks/workflow
///
/// Ingests the asynchronous result from the workflow engine. Responds 2xx
/// even for unknown or expired correlations so the engine does not retry
/// indefinitely; only the first matching delivery has any effect.
pub async fn workflow_callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let disposition = state.callbacks.ingest(payload).await?;
    let status = match disposition {
        CallbackDisposition::Resolved => "resolved",
        CallbackDisposition::Stale => "ignored",
    };
    Ok(Json(serde_json::json!({ "success": true, "status": status })))
}
