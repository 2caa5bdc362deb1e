//! Periodic keep-alive frames for push connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use crate::event::PushEvent;

use super::handle::ConnectionHandle;

/// Run the heartbeat loop for a connection.
///
/// Sends a no-op `heartbeat` event on a fixed interval so that proxies and
/// the client's own liveness check do not treat an idle-but-healthy
/// connection as dead. Ends when the connection closes.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, interval: Duration) {
    let mut ticker = time::interval(interval);
    // The first tick fires immediately; skip it, the welcome frame just went out.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if !handle.is_alive() {
            break;
        }

        if !handle.send(PushEvent::heartbeat()) && !handle.is_alive() {
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::types::id::{SessionId, UserId};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_emits_frames() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(
            UserId::new(),
            SessionId::new(),
            "test".to_string(),
            Vec::new(),
            tx,
        ));

        let task = tokio::spawn(run_heartbeat(handle.clone(), Duration::from_secs(30)));

        time::sleep(Duration::from_secs(61)).await;
        let first = rx.recv().await.expect("first heartbeat");
        assert_eq!(first.event_name(), "heartbeat");

        handle.mark_closed();
        time::sleep(Duration::from_secs(31)).await;
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_stops_on_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        let handle = Arc::new(ConnectionHandle::new(
            UserId::new(),
            SessionId::new(),
            "test".to_string(),
            Vec::new(),
            tx,
        ));
        drop(rx);

        let task = tokio::spawn(run_heartbeat(handle.clone(), Duration::from_secs(30)));
        time::sleep(Duration::from_secs(31)).await;
        task.await.unwrap();
        assert!(!handle.is_alive());
    }
}
