//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
        .is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
        "connections": state.realtime.broadcaster().connection_count(),
        "pending_actions": state.registry.len(),
    }))
}
