//! Connection pool — tracks all open connections indexed by session and user.

use std::sync::Arc;

use dashmap::DashMap;

use forma_core::types::id::{SessionId, UserId};

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all open push connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → handle, for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Session ID → handles (a session may briefly hold more than one
    /// connection across a reconnect).
    by_session: DashMap<SessionId, Vec<Arc<ConnectionHandle>>>,
    /// User ID → handles (one user can have several sessions).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_session
            .entry(handle.session_id)
            .or_default()
            .push(handle.clone());
        self.by_user.entry(handle.user_id).or_default().push(handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;

        if let Some(mut connections) = self.by_session.get_mut(&handle.session_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_session.remove(&handle.session_id);
            }
        }
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id);
            }
        }

        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all connections for a session.
    pub fn session_connections(&self, session_id: &SessionId) -> Vec<Arc<ConnectionHandle>> {
        self.by_session
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets all connections for a user.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets all connections whose identity belongs to a role group.
    pub fn group_connections(&self, group: &str) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .filter(|entry| entry.value().in_group(group))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns one entry per connected user: (user, role groups).
    ///
    /// Used by the periodic counts refresh, which computes one snapshot
    /// per identity regardless of how many connections it holds.
    pub fn connected_identities(&self) -> Vec<(UserId, Vec<String>)> {
        self.by_user
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .first()
                    .map(|h| (*entry.key(), h.groups.clone()))
            })
            .collect()
    }

    /// Returns total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PushEvent;
    use tokio::sync::mpsc;

    fn make_handle(user_id: UserId, session_id: SessionId, group: &str) -> Arc<ConnectionHandle> {
        let (tx, rx) = mpsc::channel::<PushEvent>(8);
        // Receiver is intentionally leaked so sends stay accepted.
        std::mem::forget(rx);
        Arc::new(ConnectionHandle::new(
            user_id,
            session_id,
            "test".to_string(),
            vec![group.to_string()],
            tx,
        ))
    }

    #[tokio::test]
    async fn test_add_and_remove_updates_indexes() {
        let pool = ConnectionPool::new();
        let user = UserId::new();
        let session = SessionId::new();
        let handle = make_handle(user, session, "COMMERCIAL");
        let conn_id = handle.id;

        pool.add(handle);
        assert_eq!(pool.connection_count(), 1);
        assert_eq!(pool.session_connections(&session).len(), 1);
        assert_eq!(pool.user_connections(&user).len(), 1);

        pool.remove(&conn_id);
        assert_eq!(pool.connection_count(), 0);
        assert!(pool.session_connections(&session).is_empty());
        assert!(pool.user_connections(&user).is_empty());
        assert_eq!(pool.user_count(), 0);
    }

    #[tokio::test]
    async fn test_group_lookup() {
        let pool = ConnectionPool::new();
        pool.add(make_handle(UserId::new(), SessionId::new(), "COMMERCIAL"));
        pool.add(make_handle(UserId::new(), SessionId::new(), "RECRUTEUR"));

        assert_eq!(pool.group_connections("COMMERCIAL").len(), 1);
        assert_eq!(pool.group_connections("RECRUTEUR").len(), 1);
        assert!(pool.group_connections("DIRECTION").is_empty());
    }

    #[tokio::test]
    async fn test_connected_identities_deduplicates_users() {
        let pool = ConnectionPool::new();
        let user = UserId::new();
        pool.add(make_handle(user, SessionId::new(), "COMMERCIAL"));
        pool.add(make_handle(user, SessionId::new(), "COMMERCIAL"));

        assert_eq!(pool.connection_count(), 2);
        assert_eq!(pool.connected_identities().len(), 1);
    }
}
