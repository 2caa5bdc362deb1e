//! Ties cache, REST fallback, and correlation listeners together into the
//! client-facing notification surface.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use forma_core::result::AppResult;
use forma_core::types::id::{CorrelationId, NotificationId};

use crate::api::{RestClient, TriggerAction};
use crate::cache::NotificationCache;
use crate::listener::{ActiveListeners, CompletionOutcome, CorrelationListener};
use crate::stream::EventStream;

/// Client-facing notification surface.
///
/// Owns the cache and the REST client, consumes the shared event stream,
/// and runs actions end to end: trigger, then wait for the correlation
/// resolution with a bounded local timer.
pub struct NotificationCenter {
    cache: Arc<NotificationCache>,
    rest: RestClient,
    stream: Arc<EventStream>,
    listeners: ActiveListeners,
    default_timeout: Duration,
}

impl NotificationCenter {
    /// Creates the center on top of a running event stream.
    pub fn new(rest: RestClient, stream: Arc<EventStream>, default_timeout: Duration) -> Self {
        Self {
            cache: Arc::new(NotificationCache::new()),
            rest,
            stream,
            listeners: ActiveListeners::new(),
            default_timeout,
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<NotificationCache> {
        &self.cache
    }

    /// Initial load (or explicit refresh): fetches a page and the counts
    /// over REST and replaces the local view. This is also the recovery
    /// path after a reconnect, since the push channel never replays.
    pub async fn refresh(&self) -> AppResult<()> {
        let page = self.rest.fetch_notifications(1, 25).await?;
        let counts = self.rest.fetch_counts().await?;
        self.cache.load(page.items, counts);
        debug!("Notification view refreshed");
        Ok(())
    }

    /// Spawns the pump merging pushed events into the cache.
    ///
    /// Handlers run to completion per event and never block: cache merges
    /// are plain in-memory mutations.
    pub fn spawn_event_pump(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.cache.clone();
        let mut events = self.stream.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => cache.apply_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Cache fell behind the event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Marks one notification as read, optimistically.
    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<()> {
        let patch = self.cache.begin_mark_read(id);
        match self.rest.mark_read(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.cache.rollback_read(patch);
                Err(e)
            }
        }
    }

    /// Marks everything read, optimistically.
    pub async fn mark_all_as_read(&self) -> AppResult<()> {
        let patch = self.cache.begin_mark_all_read();
        match self.rest.mark_all_read().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.cache.rollback_read_all(patch);
                Err(e)
            }
        }
    }

    /// Runs one action end to end: subscribes the listener first (so the
    /// resolution cannot slip between trigger and wait), triggers, then
    /// waits for exactly one terminal outcome.
    ///
    /// A synchronous gateway rejection (validation, conflict, dispatch
    /// failure) surfaces as `Err` without consuming the bounded wait.
    pub async fn run_action(&self, action: TriggerAction) -> AppResult<CompletionOutcome> {
        let correlation_id = action.correlation_id.clone();
        let _ticket = self.listeners.acquire(&correlation_id)?;

        let events = self.stream.subscribe();
        let ack = self.rest.trigger_action(&action).await?;

        let timeout = if ack.timeout_seconds == 0 {
            self.default_timeout
        } else {
            Duration::from_secs(ack.timeout_seconds)
        };

        let listener = CorrelationListener::new(correlation_id, timeout);
        Ok(listener.wait(events).await)
    }

    /// Generates a fresh correlation token for a new action.
    pub fn new_correlation_id(&self) -> CorrelationId {
        CorrelationId::generate()
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationCenter").finish()
    }
}
