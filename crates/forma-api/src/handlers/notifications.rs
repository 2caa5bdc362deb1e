//! Notification query and mutation handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use forma_core::types::id::NotificationId;
use forma_core::types::pagination::{PageRequest, PageResponse};
use forma_database::repositories::notification::NotificationFilter;
use forma_entity::notification::model::{Notification, NotificationCounts};
use forma_realtime::event::PushEvent;

use crate::dto::request::NotificationListQuery;
use crate::dto::response::{ApiResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::AuthSession;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Notification>>>, ApiError> {
    let filter = NotificationFilter {
        categorie: query.categorie,
        priorite: query.priorite,
        non_lues_seules: query.non_lues,
    };
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(PageRequest::default().page_size),
    );

    let result = state
        .notification_service
        .list_notifications(&auth, &filter, &page)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/notifications/counts
pub async fn counts(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<NotificationCounts>>, ApiError> {
    let counts = state.notification_service.counts(&auth).await?;
    Ok(Json(ApiResponse::ok(counts)))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<NotificationId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.notification_service.mark_read(&auth, id).await?;
    push_fresh_counts(&state, &auth).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Marked as read" } }),
    ))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.notification_service.mark_all_read(&auth).await?;
    push_fresh_counts(&state, &auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/notifications/{id}/action
///
/// Flips `action_effectuee` exactly once and pushes an `action_completed`
/// marker to every session of the identity, so other open tabs retire the
/// call-to-action too.
pub async fn execute_action(
    State(state): State<AppState>,
    auth: AuthSession,
    Path(id): Path<NotificationId>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = state.notification_service.execute_action(&auth, id).await?;

    state.realtime.broadcaster().send_to_user(
        &auth.user_id,
        &PushEvent::ActionCompleted {
            notification_id: notification.id,
        },
    );

    Ok(Json(ApiResponse::ok(notification)))
}

/// Pushes a fresh counts snapshot to the identity after a read-state
/// mutation, correcting drift in other open tabs.
async fn push_fresh_counts(state: &AppState, auth: &AuthSession) -> Result<(), ApiError> {
    let counts = state.notification_service.counts(auth).await?;
    state
        .realtime
        .broadcaster()
        .send_to_user(&auth.user_id, &PushEvent::Counts(counts));
    Ok(())
}
