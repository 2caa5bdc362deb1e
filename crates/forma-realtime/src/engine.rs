//! Top-level real-time engine that ties broadcaster, heartbeats, and the
//! periodic counts refresh together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use forma_core::config::realtime::RealtimeConfig;
use forma_core::error::AppError;
use forma_service::context::RequestContext;
use forma_service::notification::service::NotificationService;

use crate::broadcaster::Broadcaster;
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::heartbeat;
use crate::event::PushEvent;

/// Central engine owning the push connection registry.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection registry and fan-out.
    broadcaster: Arc<Broadcaster>,
    /// Notification service, for counts snapshots.
    notifications: Arc<NotificationService>,
    /// Configuration.
    config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new engine.
    pub fn new(config: RealtimeConfig, notifications: Arc<NotificationService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            broadcaster: Arc::new(Broadcaster::new(config.clone())),
            notifications,
            config,
            shutdown_tx,
        }
    }

    /// Opens a push connection for the requesting session.
    ///
    /// Registers the connection, queues the `welcome` event and the initial
    /// `counts` snapshot, and spawns the per-connection heartbeat loop.
    pub async fn open_connection(
        &self,
        ctx: &RequestContext,
    ) -> Result<(Arc<ConnectionHandle>, mpsc::Receiver<PushEvent>), AppError> {
        let (handle, rx) = self.broadcaster.register(
            ctx.user_id,
            ctx.session_id,
            ctx.display_name.clone(),
            ctx.groups.clone(),
        );

        handle.send(PushEvent::Welcome {
            session_id: ctx.session_id,
            connected_at: Utc::now(),
        });

        let counts = self.notifications.counts(ctx).await?;
        handle.send(PushEvent::Counts(counts));

        tokio::spawn(heartbeat::run_heartbeat(
            handle.clone(),
            Duration::from_secs(self.config.heartbeat_interval_seconds),
        ));

        Ok((handle, rx))
    }

    /// Tears a connection down after transport disconnect.
    pub fn close_connection(&self, conn_id: &ConnectionId) {
        self.broadcaster.unregister(conn_id);
    }

    /// The underlying broadcaster, for event producers.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Spawns the periodic counts refresh task.
    ///
    /// Re-pushes a `counts` snapshot to every connected identity so client
    /// caches correct drift (e.g. a bulk mark-as-read from another tab).
    pub fn spawn_counts_refresh(&self) -> tokio::task::JoinHandle<()> {
        let broadcaster = self.broadcaster.clone();
        let notifications = self.notifications.clone();
        let interval = Duration::from_secs(self.config.counts_refresh_interval_seconds);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.recv() => break,
                }

                for (user_id, groups) in broadcaster.pool().connected_identities() {
                    match notifications.counts_for(user_id, &groups).await {
                        Ok(counts) => {
                            broadcaster.send_to_user(&user_id, &PushEvent::Counts(counts));
                        }
                        Err(e) => {
                            error!(user_id = %user_id, error = %e, "Counts refresh failed");
                        }
                    }
                }
            }
            info!("Counts refresh task stopped");
        })
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: stops background tasks and closes
    /// every open connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.broadcaster.close_all();
    }
}
