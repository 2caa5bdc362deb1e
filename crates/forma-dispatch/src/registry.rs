//! In-memory correlation registry.
//!
//! Owns the duplicate-in-flight guard: for any (entity type, entity id,
//! action type) triple, at most one live pending correlation exists at any
//! instant. The registry is constructed once at process start and injected
//! into the gateway and the callback processor.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::{debug, info};

use forma_core::types::id::{CorrelationId, SessionId, UserId};
use forma_entity::action::types::ActionType;
use forma_entity::notification::audience::Audience;

/// Composite key of the duplicate-in-flight check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    /// Entity type.
    pub entite_type: String,
    /// Entity identifier.
    pub entite_id: i64,
    /// Action type. Two different action types on the same entity may run
    /// concurrently.
    pub action_type: ActionType,
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.entite_type, self.entite_id, self.action_type
        )
    }
}

/// A registered action awaiting its asynchronous resolution.
#[derive(Debug, Clone)]
pub struct PendingCorrelation {
    /// The client-generated token.
    pub correlation_id: CorrelationId,
    /// Composite business key.
    pub key: CorrelationKey,
    /// User that initiated the action.
    pub owner_user_id: UserId,
    /// Session that must receive the resolution.
    pub owner_session_id: SessionId,
    /// Broadcast audience for the outcome, when the action requested one.
    pub audience: Option<Audience>,
    /// When the entry was registered.
    pub registered_at: Instant,
    /// Bounded wait before the entry is evicted.
    pub timeout: Duration,
}

impl PendingCorrelation {
    /// Absolute expiry instant.
    pub fn deadline(&self) -> Instant {
        self.registered_at + self.timeout
    }

    /// Whether the entry has outlived its bounded wait.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline()
    }

    /// Remaining time-to-live, zero once expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }
}

/// Rejection returned when the composite key already has a live entry.
#[derive(Debug, Clone)]
pub struct RegisterConflict {
    /// The correlation currently holding the key.
    pub existing: CorrelationId,
    /// Its remaining time-to-live.
    pub remaining: Duration,
}

/// In-memory map from correlation token to pending action descriptor.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    /// Token → pending entry.
    by_id: DashMap<CorrelationId, PendingCorrelation>,
    /// Composite key → token holding it.
    by_key: DashMap<CorrelationKey, CorrelationId>,
}

impl CorrelationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending correlation, enforcing the one-live-entry-per-key
    /// invariant.
    ///
    /// The conflict check and the insertion happen under the key's map
    /// entry lock: of two concurrent registrations for the same key, the
    /// one acquiring the entry first wins and the loser gets the conflict.
    pub fn register(&self, pending: PendingCorrelation) -> Result<(), RegisterConflict> {
        let now = Instant::now();

        match self.by_key.entry(pending.key.clone()) {
            Entry::Occupied(mut occupied) => {
                let holder = occupied.get().clone();
                if let Some(existing) = self.by_id.get(&holder) {
                    if !existing.is_expired(now) {
                        return Err(RegisterConflict {
                            existing: holder,
                            remaining: existing.remaining(now),
                        });
                    }
                }
                // Holder expired (or vanished) but was not swept yet:
                // the key is free to take over.
                drop(self.by_id.remove(&holder));
                occupied.insert(pending.correlation_id.clone());
                self.by_id.insert(pending.correlation_id.clone(), pending);
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(pending.correlation_id.clone());
                self.by_id.insert(pending.correlation_id.clone(), pending);
                Ok(())
            }
        }
    }

    /// Resolves a pending correlation by its token.
    ///
    /// Terminal and mutually exclusive with eviction: returns `None` for
    /// unknown, already-resolved, or expired entries (an expired entry is
    /// removed on the spot; resolution and timeout never both fire).
    pub fn resolve(&self, correlation_id: &CorrelationId) -> Option<PendingCorrelation> {
        let (_, pending) = self.by_id.remove(correlation_id)?;
        self.release_key(&pending);

        if pending.is_expired(Instant::now()) {
            debug!(
                correlation_id = %correlation_id,
                key = %pending.key,
                "Resolution arrived after expiry, dropping"
            );
            return None;
        }
        Some(pending)
    }

    /// Evicts one entry regardless of expiry (dispatch-failure rollback, so
    /// a retry is not blocked by a phantom conflict).
    pub fn evict(&self, correlation_id: &CorrelationId) {
        if let Some((_, pending)) = self.by_id.remove(correlation_id) {
            self.release_key(&pending);
            debug!(correlation_id = %correlation_id, key = %pending.key, "Correlation evicted");
        }
    }

    /// Removes every expired entry. Eviction is silent: the client listener
    /// times out on its own clock.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<CorrelationId> = self
            .by_id
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        for correlation_id in &expired {
            if let Some((_, pending)) = self.by_id.remove(correlation_id) {
                self.release_key(&pending);
                debug!(
                    correlation_id = %correlation_id,
                    key = %pending.key,
                    "Expired correlation swept"
                );
            }
        }
        expired.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the registry holds no entry.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Spawns the background sweep loop.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.recv() => break,
                }
                let evicted = registry.sweep();
                if evicted > 0 {
                    info!(evicted, "Registry sweep evicted expired correlations");
                }
            }
        })
    }

    /// Frees the composite key slot if it is still held by this entry.
    fn release_key(&self, pending: &PendingCorrelation) {
        self.by_key
            .remove_if(&pending.key, |_, holder| *holder == pending.correlation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: &str, entite_id: i64, timeout_secs: u64) -> PendingCorrelation {
        PendingCorrelation {
            correlation_id: CorrelationId::from(id),
            key: CorrelationKey {
                entite_type: "candidat".to_string(),
                entite_id,
                action_type: ActionType::Refuser,
            },
            owner_user_id: UserId::new(),
            owner_session_id: SessionId::new(),
            audience: None,
            registered_at: Instant::now(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_registration_conflicts_with_remaining_ttl() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        let conflict = registry.register(pending("c2", 42, 60)).unwrap_err();
        assert_eq!(conflict.existing, CorrelationId::from("c1"));
        assert_eq!(conflict.remaining, Duration::from_secs(55));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_entities_do_not_conflict() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();
        registry.register(pending("c2", 43, 60)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_action_types_do_not_conflict() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();

        let mut other = pending("c2", 42, 60);
        other.key.action_type = ActionType::Relancer;
        registry.register(other).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_is_terminal() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();

        assert!(registry.resolve(&CorrelationId::from("c1")).is_some());
        assert!(registry.resolve(&CorrelationId::from("c1")).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_frees_key_for_retry() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();
        registry.resolve(&CorrelationId::from("c1")).unwrap();
        registry.register(pending("c2", 42, 60)).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_resolves_to_none() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(registry.resolve(&CorrelationId::from("c1")).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_expired() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 10)).unwrap();
        registry.register(pending("c2", 43, 120)).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(&CorrelationId::from("c2")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_unswept_key_can_be_retaken() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 10)).unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        // No sweep ran, the slot is stale: a new registration takes over.
        registry.register(pending("c2", 42, 60)).unwrap();
        assert!(registry.resolve(&CorrelationId::from("c1")).is_none());
        assert!(registry.resolve(&CorrelationId::from("c2")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_unblocks_key_immediately() {
        let registry = CorrelationRegistry::new();
        registry.register(pending("c1", 42, 60)).unwrap();
        registry.evict(&CorrelationId::from("c1"));
        registry.register(pending("c2", 42, 60)).unwrap();
    }
}
