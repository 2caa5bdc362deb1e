//! Local notification cache.
//!
//! Ordered, deduplicated, most-recent-first view of notifications plus
//! derived counts. Pushed events merge into it; read-state mutations apply
//! speculatively and either commit (a no-op) or roll back when the backing
//! request fails. While the push connection is down the cache keeps
//! serving its last-known state.

use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use forma_core::types::id::NotificationId;
use forma_entity::notification::model::{Notification, NotificationCounts};

use crate::events::ClientEvent;

/// Rollback token for an optimistic single-row read transition.
#[derive(Debug)]
pub struct ReadPatch {
    id: NotificationId,
    /// Whether the speculative apply actually flipped the row.
    transitioned: bool,
}

/// Rollback token for an optimistic mark-all-read.
#[derive(Debug)]
pub struct ReadAllPatch {
    transitioned: Vec<NotificationId>,
    previous_counts: NotificationCounts,
}

#[derive(Debug, Default)]
struct CacheState {
    /// Most-recent-first.
    items: Vec<Notification>,
    /// Ids present in `items`, for O(1) dedup.
    seen: HashSet<Uuid>,
    /// Authoritative aggregate counts.
    counts: NotificationCounts,
}

/// Thread-safe local view of the identity's notifications.
#[derive(Debug, Default)]
pub struct NotificationCache {
    state: RwLock<CacheState>,
}

impl NotificationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the view with a freshly fetched page and counts.
    pub fn load(&self, items: Vec<Notification>, counts: NotificationCounts) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.seen = items.iter().map(|n| n.id.into_uuid()).collect();
        state.items = items;
        state.counts = counts;
    }

    /// Merges one pushed event into the view.
    pub fn apply_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Notification(notification) => {
                self.insert_pushed(notification.as_ref().clone());
            }
            ClientEvent::Counts(counts) => {
                let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                state.counts = *counts;
            }
            ClientEvent::ActionCompleted { notification_id } => {
                let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                if let Some(item) = state.items.iter_mut().find(|n| n.id == *notification_id) {
                    item.action_effectuee = true;
                }
            }
            ClientEvent::Welcome { .. } | ClientEvent::Heartbeat => {}
            ClientEvent::CorrelationResolved { .. } => {
                // Resolution events only matter to correlation listeners;
                // the outcome notification arrives separately.
            }
        }
    }

    /// Prepends a pushed notification unless its id is already present,
    /// bumping the affected counts.
    fn insert_pushed(&self, notification: Notification) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if !state.seen.insert(notification.id.into_uuid()) {
            return;
        }

        state.counts.total += 1;
        if notification.is_unread() {
            state.counts.non_lues += 1;
            if notification.priorite.is_urgent() {
                state.counts.urgentes += 1;
            }
            if notification.awaits_action() {
                state.counts.actions_requises += 1;
            }
        }
        state.items.insert(0, notification);
    }

    /// Speculatively marks one row read. Commit by dropping the patch;
    /// roll back with [`NotificationCache::rollback_read`].
    pub fn begin_mark_read(&self, id: NotificationId) -> ReadPatch {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let state = &mut *state;
        let mut transitioned = false;

        if let Some(item) = state.items.iter_mut().find(|n| n.id == id && n.is_unread()) {
            item.lue = true;
            item.date_lecture = Some(Utc::now());
            let urgent = item.priorite.is_urgent();
            let awaiting = item.awaits_action();

            state.counts.non_lues -= 1;
            if urgent {
                state.counts.urgentes -= 1;
            }
            if awaiting {
                state.counts.actions_requises -= 1;
            }
            transitioned = true;
        }

        ReadPatch { id, transitioned }
    }

    /// Compensates a failed mark-read request.
    pub fn rollback_read(&self, patch: ReadPatch) {
        if !patch.transitioned {
            return;
        }
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let state = &mut *state;
        if let Some(item) = state.items.iter_mut().find(|n| n.id == patch.id) {
            item.lue = false;
            item.date_lecture = None;
            let urgent = item.priorite.is_urgent();
            let awaiting = item.awaits_action();

            state.counts.non_lues += 1;
            if urgent {
                state.counts.urgentes += 1;
            }
            if awaiting {
                state.counts.actions_requises += 1;
            }
        }
    }

    /// Speculatively marks everything read.
    pub fn begin_mark_all_read(&self) -> ReadAllPatch {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let previous_counts = state.counts;

        let mut transitioned = Vec::new();
        for item in state.items.iter_mut().filter(|n| n.is_unread()) {
            item.lue = true;
            item.date_lecture = Some(Utc::now());
            transitioned.push(item.id);
        }

        state.counts.non_lues = 0;
        state.counts.urgentes = 0;
        state.counts.actions_requises = 0;

        ReadAllPatch {
            transitioned,
            previous_counts,
        }
    }

    /// Compensates a failed mark-all-read request.
    pub fn rollback_read_all(&self, patch: ReadAllPatch) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        for id in &patch.transitioned {
            if let Some(item) = state.items.iter_mut().find(|n| n.id == *id) {
                item.lue = false;
                item.date_lecture = None;
            }
        }
        state.counts = patch.previous_counts;
    }

    /// Snapshot of the ordered view.
    pub fn items(&self) -> Vec<Notification> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .items
            .clone()
    }

    /// Snapshot of the derived counts.
    pub fn counts(&self) -> NotificationCounts {
        self.state.read().unwrap_or_else(|e| e.into_inner()).counts
    }
}
