//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use forma_core::config::AppConfig;
use forma_database::repositories::notification::NotificationRepository;
use forma_dispatch::callback::CallbackProcessor;
use forma_dispatch::gateway::ActionDispatchGateway;
use forma_dispatch::registry::CorrelationRegistry;
use forma_realtime::engine::RealtimeEngine;
use forma_service::notification::service::NotificationService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Notification repository.
    pub notification_repo: Arc<NotificationRepository>,
    /// Notification service.
    pub notification_service: Arc<NotificationService>,
    /// Push connection engine.
    pub realtime: Arc<RealtimeEngine>,
    /// Correlation registry.
    pub registry: Arc<CorrelationRegistry>,
    /// Action dispatch gateway.
    pub gateway: Arc<ActionDispatchGateway>,
    /// Workflow callback processor.
    pub callbacks: Arc<CallbackProcessor>,
}
