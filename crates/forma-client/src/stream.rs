//! The long-lived push stream with drop detection and reconnection.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use forma_core::error::AppError;
use forma_core::result::AppResult;

use crate::config::ClientConfig;
use crate::events::{ClientEvent, SseFrameParser};

/// Capacity of the fan-out channel feeding listeners and the cache.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the push connection and fans received events out to any number of
/// subscribers (correlation listeners, the notification cache, loggers).
///
/// On an unexpected close, a single reconnection attempt is scheduled
/// after the configured fixed backoff, never an immediate retry loop.
/// No replay is assumed across reconnects: the server re-sends `welcome`
/// and a fresh `counts` snapshot, and anything else missed is recovered
/// through the pull path.
#[derive(Debug)]
pub struct EventStream {
    config: ClientConfig,
    client: reqwest::Client,
    events_tx: broadcast::Sender<ClientEvent>,
}

impl EventStream {
    /// Creates a stream manager (no connection yet; see [`EventStream::run`]).
    pub fn new(config: ClientConfig) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            client: reqwest::Client::new(),
            events_tx,
        }
    }

    /// Subscribes to the shared event fan-out.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events_tx.subscribe()
    }

    /// Runs the connect/read/reconnect loop until the process stops.
    pub async fn run(&self) {
        loop {
            match self.connect_and_pump().await {
                Ok(()) => {
                    info!("Push connection closed by server");
                }
                Err(e) => {
                    warn!(error = %e, "Push connection failed");
                }
            }

            let backoff = self.config.reconnect_backoff();
            debug!(backoff_s = backoff.as_secs(), "Scheduling reconnection");
            tokio::time::sleep(backoff).await;
        }
    }

    /// Opens one connection and pumps frames until it ends.
    async fn connect_and_pump(&self) -> AppResult<()> {
        let url = format!("{}/api/events", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("accept", "text/event-stream")
            .header("x-forma-user", self.config.user_id.to_string())
            .header("x-forma-session", self.config.session_id.to_string())
            .header("x-forma-name", &self.config.display_name)
            .header("x-forma-groups", self.config.groups.join(","))
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Connect failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::service_unavailable(format!(
                "Push endpoint returned HTTP {}",
                response.status()
            )));
        }

        info!("Push connection established");

        let mut parser = SseFrameParser::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| AppError::service_unavailable(format!("Read failed: {e}")))?;
            let text = String::from_utf8_lossy(&chunk);

            for (event_name, data) in parser.feed(&text) {
                match ClientEvent::parse(&event_name, &data) {
                    Ok(event) => {
                        // Nobody subscribed yet is fine; events are
                        // at-most-once by design.
                        let _ = self.events_tx.send(event);
                    }
                    Err(e) => {
                        warn!(event = %event_name, error = %e, "Dropping unparseable event");
                    }
                }
            }
        }

        Ok(())
    }
}

/// One reconnection delay, exposed for pacing tests.
pub fn reconnect_delay(config: &ClientConfig) -> Duration {
    config.reconnect_backoff()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::types::id::{SessionId, UserId};

    #[test]
    fn test_backoff_is_fixed_not_zero() {
        let config = ClientConfig {
            base_url: "http://localhost:8080".to_string(),
            user_id: UserId::new(),
            session_id: SessionId::new(),
            display_name: "t".to_string(),
            groups: Vec::new(),
            reconnect_backoff_seconds: 5,
            default_action_timeout_seconds: 60,
        };
        assert_eq!(reconnect_delay(&config), Duration::from_secs(5));
    }
}
