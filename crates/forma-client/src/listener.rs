//! Per-action correlation listeners.
//!
//! One listener per initiated action: it filters the shared push stream
//! for its correlation token, races the matching resolution event against
//! a local bounded wait, and reports exactly one terminal outcome.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

use forma_core::error::AppError;
use forma_core::result::AppResult;
use forma_core::types::id::CorrelationId;

use crate::events::{ClientEvent, ResolutionStatus};

/// Lifecycle of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Created, not yet waiting.
    Idle,
    /// Waiting for the resolution event or the local timer.
    Pending,
    /// Terminal: the engine completed the action.
    Success,
    /// Terminal: the engine reported a business failure.
    Error,
    /// Terminal: no event arrived within the bounded wait.
    Timeout,
}

/// The single terminal outcome reported to the initiating UI flow.
///
/// `Timeout` is surfaced like an error but with distinct copy: the action
/// may still complete later and arrive as a general notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The action completed.
    Success,
    /// The engine reported a business failure.
    Error,
    /// Could not confirm within the bounded wait.
    Timeout,
}

/// A one-shot listener for a single correlation token.
#[derive(Debug)]
pub struct CorrelationListener {
    correlation_id: CorrelationId,
    timeout: Duration,
    state: ListenerState,
}

impl CorrelationListener {
    /// Creates an idle listener.
    pub fn new(correlation_id: CorrelationId, timeout: Duration) -> Self {
        Self {
            correlation_id,
            timeout,
            state: ListenerState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Waits for the resolution, consuming the listener.
    ///
    /// The local timer and the event race; whichever fires first wins and
    /// the loser is a guaranteed no-op: the listener is gone once a
    /// terminal outcome is produced, so a late resolution cannot re-invoke
    /// anything (the notification cache still processes it independently).
    pub async fn wait(
        mut self,
        mut events: broadcast::Receiver<ClientEvent>,
    ) -> CompletionOutcome {
        self.state = ListenerState::Pending;

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = &mut deadline => {
                    debug!(correlation_id = %self.correlation_id, "Local wait expired");
                    return CompletionOutcome::Timeout;
                }
                received = events.recv() => {
                    match received {
                        Ok(ClientEvent::CorrelationResolved { correlation_id, status })
                            if correlation_id == self.correlation_id =>
                        {
                            return match status {
                                ResolutionStatus::Success => CompletionOutcome::Success,
                                ResolutionStatus::Error => CompletionOutcome::Error,
                            };
                        }
                        // Other events, other correlations: keep waiting.
                        Ok(_) => {}
                        // Fell behind the fan-out; resume from the next event.
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(
                                correlation_id = %self.correlation_id,
                                skipped,
                                "Listener lagged behind the event stream"
                            );
                        }
                        // Stream gone for good: only the timer can end the wait.
                        Err(broadcast::error::RecvError::Closed) => {
                            (&mut deadline).await;
                            return CompletionOutcome::Timeout;
                        }
                    }
                }
            }
        }
    }
}

/// Guard set enforcing at most one listener per correlation token.
#[derive(Debug, Default, Clone)]
pub struct ActiveListeners {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveListeners {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a token for a new listener.
    pub fn acquire(&self, correlation_id: &CorrelationId) -> AppResult<ListenerTicket> {
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(correlation_id.as_str().to_string()) {
            return Err(AppError::conflict(format!(
                "A listener is already waiting on correlation {correlation_id}"
            )));
        }
        Ok(ListenerTicket {
            set: self.inner.clone(),
            correlation_id: correlation_id.as_str().to_string(),
        })
    }
}

/// Releases the claimed token on drop.
#[derive(Debug)]
pub struct ListenerTicket {
    set: Arc<Mutex<HashSet<String>>>,
    correlation_id: String,
}

impl Drop for ListenerTicket {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.correlation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_starts_idle() {
        let listener =
            CorrelationListener::new(CorrelationId::from("c1"), Duration::from_secs(60));
        assert_eq!(listener.state(), ListenerState::Idle);
    }

    #[test]
    fn test_double_listener_rejected() {
        let active = ActiveListeners::new();
        let id = CorrelationId::from("c1");
        let ticket = active.acquire(&id).unwrap();
        assert!(active.acquire(&id).is_err());
        drop(ticket);
        assert!(active.acquire(&id).is_ok());
    }
}
