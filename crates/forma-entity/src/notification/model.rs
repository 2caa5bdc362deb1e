//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use forma_core::types::id::NotificationId;

use super::audience::Audience;
use super::category::NotificationCategory;
use super::priority::NotificationPriority;
use super::source::SourceAgent;
use crate::action::types::ActionType;

/// A persisted notification, one row per event.
///
/// Rows are created by the callback ingestion path (or internal jobs for
/// purely informational events), mutated only by the read-state and
/// action-completion transitions, and never physically deleted by this
/// subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique identifier, time-ordered by creation.
    pub id: NotificationId,
    /// Who or what produced the notification.
    pub source_agent: SourceAgent,
    /// Category for filtering and icon/color selection.
    pub categorie: NotificationCategory,
    /// Finer-grained event type within the category.
    #[serde(rename = "type")]
    pub type_notification: String,
    /// Priority level.
    pub priorite: NotificationPriority,
    /// Visibility scope.
    pub audience: Audience,
    /// Title shown in the list view.
    pub titre: String,
    /// Body text.
    pub message: String,
    /// Weak back-reference: type of the business object concerned.
    ///
    /// The referenced entity may later be deleted without invalidating
    /// the notification.
    pub entite_type: Option<String>,
    /// Weak back-reference: identifier of the business object concerned.
    pub entite_id: Option<i64>,
    /// Optional call-to-action link.
    pub lien_action: Option<String>,
    /// Whether a follow-up action is expected from the reader.
    pub action_requise: bool,
    /// The suggested follow-up action, when one is expected.
    pub type_action: Option<ActionType>,
    /// Whether the suggested action has been performed. Transitions
    /// false→true exactly once, never reversed.
    pub action_effectuee: bool,
    /// Read state. Transitions false→true, never reverts.
    pub lue: bool,
    /// When the notification was read.
    pub date_lecture: Option<DateTime<Utc>>,
    /// Additional structured data (JSON).
    pub payload: Option<serde_json::Value>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.lue
    }

    /// Whether the notification still awaits its suggested action.
    pub fn awaits_action(&self) -> bool {
        self.action_requise && !self.action_effectuee
    }
}

/// Aggregate notification counts for one identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationCounts {
    /// All visible notifications.
    pub total: i64,
    /// Unread notifications.
    pub non_lues: i64,
    /// Unread notifications with URGENTE priority.
    pub urgentes: i64,
    /// Unread notifications awaiting an action.
    pub actions_requises: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification {
            id: NotificationId::now(),
            source_agent: SourceAgent::Automatisation,
            categorie: NotificationCategory::Action,
            type_notification: "action_terminee".to_string(),
            priorite: NotificationPriority::Normale,
            audience: Audience::tous(),
            titre: "Devis genere".to_string(),
            message: "Le devis P-2026-041 est disponible".to_string(),
            entite_type: Some("prospect".to_string()),
            entite_id: Some(41),
            lien_action: None,
            action_requise: true,
            type_action: Some(ActionType::Relancer),
            action_effectuee: false,
            lue: false,
            date_lecture: None,
            payload: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unread_and_awaiting() {
        let n = sample();
        assert!(n.is_unread());
        assert!(n.awaits_action());
    }

    #[test]
    fn test_action_done_stops_awaiting() {
        let mut n = sample();
        n.action_effectuee = true;
        assert!(!n.awaits_action());
    }

    #[test]
    fn test_serde_type_field_renamed() {
        let n = sample();
        let value = serde_json::to_value(&n).unwrap();
        assert!(value.get("type").is_some());
        assert!(value.get("type_notification").is_none());
    }
}
