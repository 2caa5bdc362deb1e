//! Broadcaster — connection registry and event fan-out.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use forma_core::config::realtime::RealtimeConfig;
use forma_core::types::id::{SessionId, UserId};
use forma_entity::notification::audience::Audience;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::pool::ConnectionPool;
use crate::event::PushEvent;

/// Registry of open push connections with per-audience fan-out.
///
/// Delivery is best-effort: events addressed to an identity with no open
/// connection are dropped, and the client recovers through its pull path.
#[derive(Debug)]
pub struct Broadcaster {
    /// Connection pool.
    pool: ConnectionPool,
    /// Configuration.
    config: RealtimeConfig,
}

impl Broadcaster {
    /// Creates a new broadcaster.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            pool: ConnectionPool::new(),
            config,
        }
    }

    /// Registers a new connection for an authenticated identity.
    ///
    /// Returns the connection handle and the receiver backing the
    /// connection's outbound stream.
    pub fn register(
        &self,
        user_id: UserId,
        session_id: SessionId,
        display_name: String,
        groups: Vec<String>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(
            user_id,
            session_id,
            display_name,
            groups,
            tx,
        ));

        // Enforce the per-user cap by replacing the oldest connection.
        let existing = self.pool.user_connections(&user_id);
        if existing.len() >= self.config.max_connections_per_user {
            warn!(
                user_id = %user_id,
                count = existing.len(),
                max = self.config.max_connections_per_user,
                "User at max push connections, oldest will be replaced"
            );
            if let Some(oldest) = existing.first() {
                oldest.mark_closed();
                self.pool.remove(&oldest.id);
            }
        }

        self.pool.add(handle.clone());

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            session_id = %session_id,
            "Push connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection after transport disconnect.
    ///
    /// Pending correlations owned by the session are untouched: resolution
    /// pushes target the session identity, so a fresh connection for the
    /// same session receives subsequent events normally.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_closed();
            info!(
                conn_id = %conn_id,
                user_id = %handle.user_id,
                "Push connection unregistered"
            );
        }
    }

    /// Pushes one event to every open connection of a session.
    /// Returns the number of connections the frame was queued on.
    pub fn send_to_session(&self, session_id: &SessionId, event: &PushEvent) -> usize {
        let mut sent = 0;
        for conn in self.pool.session_connections(session_id) {
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Pushes one event to every open connection of a user.
    pub fn send_to_user(&self, user_id: &UserId, event: &PushEvent) -> usize {
        let mut sent = 0;
        for conn in self.pool.user_connections(user_id) {
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Pushes one event to every open connection of a role group.
    pub fn broadcast_group(&self, group: &str, event: &PushEvent) -> usize {
        let mut sent = 0;
        for conn in self.pool.group_connections(group) {
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Pushes one event to every open connection.
    pub fn broadcast_all(&self, event: &PushEvent) -> usize {
        let mut sent = 0;
        for conn in self.pool.all_connections() {
            if conn.send(event.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Routes one event to an audience.
    pub fn deliver(&self, audience: &Audience, event: &PushEvent) -> usize {
        match audience {
            Audience::User(user_id) => self.send_to_user(user_id, event),
            Audience::Groupe(_) if audience.is_broadcast() => self.broadcast_all(event),
            Audience::Groupe(group) => self.broadcast_group(group, event),
        }
    }

    /// Closes every open connection (graceful shutdown).
    pub fn close_all(&self) {
        for conn in self.pool.all_connections() {
            conn.mark_closed();
            self.pool.remove(&conn.id);
        }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcaster() -> Broadcaster {
        Broadcaster::new(RealtimeConfig::default())
    }

    #[tokio::test]
    async fn test_send_targets_exactly_one_session() {
        let b = broadcaster();
        let user = UserId::new();
        let (s1, s2) = (SessionId::new(), SessionId::new());
        let (_h1, mut rx1) = b.register(user, s1, "a".to_string(), Vec::new());
        let (_h2, mut rx2) = b.register(user, s2, "a".to_string(), Vec::new());

        assert_eq!(b.send_to_session(&s1, &PushEvent::heartbeat()), 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_missing_session_is_dropped() {
        let b = broadcaster();
        assert_eq!(b.send_to_session(&SessionId::new(), &PushEvent::heartbeat()), 0);
    }

    #[tokio::test]
    async fn test_group_broadcast_filters_membership() {
        let b = broadcaster();
        let (_h1, mut rx1) = b.register(
            UserId::new(),
            SessionId::new(),
            "a".to_string(),
            vec!["COMMERCIAL".to_string()],
        );
        let (_h2, mut rx2) = b.register(
            UserId::new(),
            SessionId::new(),
            "b".to_string(),
            vec!["RECRUTEUR".to_string()],
        );

        assert_eq!(b.broadcast_group("COMMERCIAL", &PushEvent::heartbeat()), 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tous_audience_reaches_everyone() {
        let b = broadcaster();
        let (_h1, mut rx1) = b.register(
            UserId::new(),
            SessionId::new(),
            "a".to_string(),
            vec!["COMMERCIAL".to_string()],
        );
        let (_h2, mut rx2) = b.register(
            UserId::new(),
            SessionId::new(),
            "b".to_string(),
            vec!["RECRUTEUR".to_string()],
        );

        assert_eq!(b.deliver(&Audience::tous(), &PushEvent::heartbeat()), 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_max_connections_per_user_replaces_oldest() {
        let mut config = RealtimeConfig::default();
        config.max_connections_per_user = 2;
        let b = Broadcaster::new(config);
        let user = UserId::new();

        let (h1, _rx1) = b.register(user, SessionId::new(), "a".to_string(), Vec::new());
        let (_h2, _rx2) = b.register(user, SessionId::new(), "a".to_string(), Vec::new());
        let (_h3, _rx3) = b.register(user, SessionId::new(), "a".to_string(), Vec::new());

        assert_eq!(b.pool().user_connections(&user).len(), 2);
        assert!(!h1.is_alive());
    }
}
