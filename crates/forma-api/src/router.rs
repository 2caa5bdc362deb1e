//! Route definitions for the Forma HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(action_routes())
        .merge(callback_routes())
        .merge(notification_routes())
        .merge(event_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state))
        .with_state(state)
}

/// Action trigger endpoint
fn action_routes() -> Router<AppState> {
    Router::new().route("/actions/trigger", post(handlers::actions::trigger_action))
}

/// Workflow engine callback ingestion
fn callback_routes() -> Router<AppState> {
    Router::new().route(
        "/callbacks/workflow",
        post(handlers::callback::workflow_callback),
    )
}

/// Notification queries and mutations
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route("/notifications/counts", get(handlers::notifications::counts))
        .route(
            "/notifications/{id}/read",
            put(handlers::notifications::mark_read),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notifications::mark_all_read),
        )
        .route(
            "/notifications/{id}/action",
            post(handlers::notifications::execute_action),
        )
}

/// The per-session push connection
fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(handlers::events::open_stream))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.cors.allowed_origins;
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<axum::http::HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(parsed)
    }
}
