//! Forma CRM server — action correlation and real-time notification core.
//!
//! Main entry point that wires the crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use forma_core::config::AppConfig;
use forma_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("FORMA_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Forma CRM core v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────
    let db = forma_database::connection::DatabasePool::connect(&config.database).await?;
    forma_database::migration::run_migrations(db.pool()).await?;
    let db_pool = db.into_pool();

    // ── Repositories and services ────────────────────────────────
    let notification_repo = Arc::new(
        forma_database::repositories::notification::NotificationRepository::new(db_pool.clone()),
    );
    let notification_service = Arc::new(
        forma_service::notification::service::NotificationService::new(notification_repo.clone()),
    );

    // ── Realtime engine ──────────────────────────────────────────
    let realtime = Arc::new(forma_realtime::engine::RealtimeEngine::new(
        config.realtime.clone(),
        notification_service.clone(),
    ));
    let counts_task = realtime.spawn_counts_refresh();

    // ── Dispatch layer ───────────────────────────────────────────
    let registry = Arc::new(forma_dispatch::registry::CorrelationRegistry::new());
    let sweeper_task = registry.spawn_sweeper(
        Duration::from_secs(config.dispatch.sweep_interval_seconds),
        realtime.shutdown_receiver(),
    );

    let engine: Arc<dyn forma_dispatch::engine::WorkflowEngine> = Arc::new(
        forma_dispatch::engine::HttpWorkflowEngine::new(&config.dispatch)?,
    );
    let gateway = Arc::new(forma_dispatch::gateway::ActionDispatchGateway::new(
        registry.clone(),
        engine,
        config.dispatch.clone(),
    ));
    let callbacks = Arc::new(forma_dispatch::callback::CallbackProcessor::new(
        registry.clone(),
        notification_service.clone(),
        realtime.broadcaster().clone(),
    ));

    // ── HTTP surface ─────────────────────────────────────────────
    let state = forma_api::state::AppState {
        config: Arc::new(config.clone()),
        db_pool,
        notification_repo,
        notification_service,
        realtime: realtime.clone(),
        registry,
        gateway,
        callbacks,
    };

    let router = forma_api::build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Forma server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Shutdown ─────────────────────────────────────────────────
    realtime.shutdown();
    counts_task.abort();
    sweeper_task.abort();
    tracing::info!("Forma server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
