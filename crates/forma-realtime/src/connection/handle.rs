//! Individual push connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use forma_core::types::id::{SessionId, UserId};

use crate::event::PushEvent;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single open push connection.
///
/// Holds the sender side of the connection's outbound queue plus metadata
/// about the connected identity. The queue serializes all writes to the
/// connection; different connections are fully independent.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Browser session this connection belongs to.
    pub session_id: SessionId,
    /// Display name (cached for log lines).
    pub display_name: String,
    /// Role groups the identity belongs to.
    pub groups: Vec<String>,
    /// Sender for outbound events.
    sender: mpsc::Sender<PushEvent>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        display_name: String,
        groups: Vec<String>,
        sender: mpsc::Sender<PushEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id,
            display_name,
            groups,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Queue one event for this connection.
    ///
    /// Never blocks: a full queue (stalled client) drops the frame so that
    /// a slow connection cannot delay delivery to others. Returns whether
    /// the frame was queued.
    pub fn send(&self, event: PushEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as closed.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Whether the identity behind this connection belongs to a role group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_capacity(capacity: usize) -> (ConnectionHandle, mpsc::Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = ConnectionHandle::new(
            UserId::new(),
            SessionId::new(),
            "Claire".to_string(),
            vec!["COMMERCIAL".to_string()],
            tx,
        );
        (handle, rx)
    }

    #[tokio::test]
    async fn test_full_queue_drops_frame() {
        let (handle, _rx) = handle_with_capacity(1);
        assert!(handle.send(PushEvent::heartbeat()));
        assert!(!handle.send(PushEvent::heartbeat()));
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_closed_receiver_marks_dead() {
        let (handle, rx) = handle_with_capacity(1);
        drop(rx);
        assert!(!handle.send(PushEvent::heartbeat()));
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_group_membership() {
        let (handle, _rx) = handle_with_capacity(1);
        assert!(handle.in_group("COMMERCIAL"));
        assert!(!handle.in_group("RECRUTEUR"));
    }
}
