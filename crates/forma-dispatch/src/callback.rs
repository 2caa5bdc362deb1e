//! Callback ingestion: resolves correlations and fans the outcome out.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use forma_core::result::AppResult;
use forma_core::types::id::NotificationId;
use forma_entity::notification::audience::Audience;
use forma_entity::notification::category::NotificationCategory;
use forma_entity::notification::model::Notification;
use forma_entity::notification::priority::NotificationPriority;
use forma_entity::notification::source::SourceAgent;
use forma_realtime::broadcaster::Broadcaster;
use forma_realtime::event::{PushEvent, ResolutionStatus};
use forma_service::notification::service::NotificationService;

use crate::registry::{CorrelationRegistry, PendingCorrelation};
use crate::types::{ActionOutcome, CallbackPayload};

/// What the ingestion did with a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// A pending correlation matched: notification persisted and pushed.
    Resolved,
    /// No live correlation matched (expired, unknown, or already
    /// resolved): acknowledged as a no-op.
    Stale,
}

/// Processes asynchronous results from the external workflow engine.
///
/// Idempotent under at-least-once delivery: only the delivery that wins
/// the registry resolution persists and pushes; every other one is a
/// [`CallbackDisposition::Stale`] no-op.
pub struct CallbackProcessor {
    /// Correlation registry (shared with the gateway).
    registry: Arc<CorrelationRegistry>,
    /// Notification persistence.
    notifications: Arc<NotificationService>,
    /// Push fan-out.
    broadcaster: Arc<Broadcaster>,
}

impl std::fmt::Debug for CallbackProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackProcessor").finish()
    }
}

impl CallbackProcessor {
    /// Creates a new callback processor.
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        notifications: Arc<NotificationService>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            notifications,
            broadcaster,
        }
    }

    /// Ingests one callback from the workflow engine.
    pub async fn ingest(&self, payload: CallbackPayload) -> AppResult<CallbackDisposition> {
        let Some(pending) = self.registry.resolve(&payload.correlation_id) else {
            warn!(
                correlation_id = %payload.correlation_id,
                "Callback for unknown or expired correlation, dropping"
            );
            return Ok(CallbackDisposition::Stale);
        };

        let notification = synthesize_notification(&pending, &payload);
        let audience = notification.audience.clone();
        let notification = self.notifications.create_notification(notification).await?;

        self.broadcaster
            .deliver(&audience, &PushEvent::Notification(Box::new(notification)));

        let status = match payload.outcome {
            ActionOutcome::Success => ResolutionStatus::Success,
            ActionOutcome::Error => ResolutionStatus::Error,
        };
        self.broadcaster.send_to_session(
            &pending.owner_session_id,
            &PushEvent::CorrelationResolved {
                correlation_id: payload.correlation_id.clone(),
                status,
            },
        );

        info!(
            correlation_id = %payload.correlation_id,
            key = %pending.key,
            outcome = ?payload.outcome,
            "Correlation resolved"
        );
        Ok(CallbackDisposition::Resolved)
    }
}

/// Builds the persisted notification for a resolved correlation.
///
/// Success and error outcomes use different category/priority defaults;
/// the result payload may override title and message.
pub fn synthesize_notification(
    pending: &PendingCorrelation,
    payload: &CallbackPayload,
) -> Notification {
    let (type_notification, priorite, default_titre) = match payload.outcome {
        ActionOutcome::Success => (
            "action_terminee".to_string(),
            NotificationPriority::Normale,
            format!("Action {} terminee", pending.key.action_type),
        ),
        ActionOutcome::Error => (
            "action_echouee".to_string(),
            NotificationPriority::Haute,
            format!("Action {} en echec", pending.key.action_type),
        ),
    };

    let titre = payload
        .result_payload
        .get("titre")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or(default_titre);

    let message = payload
        .result_payload
        .get("message")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| {
            format!(
                "{} {} : resultat disponible",
                pending.key.entite_type, pending.key.entite_id
            )
        });

    let audience = pending
        .audience
        .clone()
        .unwrap_or(Audience::User(pending.owner_user_id));

    Notification {
        id: NotificationId::now(),
        source_agent: SourceAgent::Automatisation,
        categorie: NotificationCategory::Action,
        type_notification,
        priorite,
        audience,
        titre,
        message,
        entite_type: Some(pending.key.entite_type.clone()),
        entite_id: Some(pending.key.entite_id),
        lien_action: None,
        action_requise: false,
        type_action: None,
        action_effectuee: false,
        lue: false,
        date_lecture: None,
        payload: if payload.result_payload.is_null() {
            None
        } else {
            Some(payload.result_payload.clone())
        },
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CorrelationKey;
    use forma_core::types::id::{CorrelationId, SessionId, UserId};
    use forma_entity::action::types::ActionType;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    fn pending() -> PendingCorrelation {
        PendingCorrelation {
            correlation_id: CorrelationId::from("c1"),
            key: CorrelationKey {
                entite_type: "candidat".to_string(),
                entite_id: 42,
                action_type: ActionType::Refuser,
            },
            owner_user_id: UserId::new(),
            owner_session_id: SessionId::new(),
            audience: None,
            registered_at: Instant::now(),
            timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_error_outcome_raises_priority() {
        let p = pending();
        let payload = CallbackPayload {
            correlation_id: CorrelationId::from("c1"),
            outcome: ActionOutcome::Error,
            result_payload: serde_json::Value::Null,
        };
        let n = synthesize_notification(&p, &payload);
        assert_eq!(n.priorite, NotificationPriority::Haute);
        assert_eq!(n.type_notification, "action_echouee");
        assert_eq!(n.audience, Audience::User(p.owner_user_id));
        assert!(n.payload.is_none());
    }

    #[tokio::test]
    async fn test_result_payload_overrides_text() {
        let p = pending();
        let payload = CallbackPayload {
            correlation_id: CorrelationId::from("c1"),
            outcome: ActionOutcome::Success,
            result_payload: json!({ "titre": "Refus envoye", "message": "Email parti" }),
        };
        let n = synthesize_notification(&p, &payload);
        assert_eq!(n.titre, "Refus envoye");
        assert_eq!(n.message, "Email parti");
        assert_eq!(n.priorite, NotificationPriority::Normale);
        assert_eq!(n.entite_id, Some(42));
    }

    #[tokio::test]
    async fn test_explicit_audience_wins() {
        let mut p = pending();
        p.audience = Some(Audience::tous());
        let payload = CallbackPayload {
            correlation_id: CorrelationId::from("c1"),
            outcome: ActionOutcome::Success,
            result_payload: serde_json::Value::Null,
        };
        let n = synthesize_notification(&p, &payload);
        assert!(n.audience.is_broadcast());
    }
}
