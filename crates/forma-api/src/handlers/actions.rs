//! Action trigger handler.

use axum::Json;
use axum::extract::State;

use forma_dispatch::types::DispatchAck;

use crate::dto::request::TriggerActionRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthSession;
use crate::state::AppState;

/// POST /api/actions/trigger
///
/// Registers the correlation and forwards the action to the workflow
/// engine. Returns an acknowledgement only; the business outcome arrives
/// on the push connection.
pub async fn trigger_action(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(request): Json<TriggerActionRequest>,
) -> Result<Json<ApiResponse<DispatchAck>>, ApiError> {
    let request = request.into_action_request()?;
    let ack = state.gateway.trigger(&auth, request).await?;
    Ok(Json(ApiResponse::ok(ack)))
}
