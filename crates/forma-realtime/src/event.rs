//! Outbound push event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forma_core::types::id::{CorrelationId, NotificationId, SessionId};
use forma_entity::notification::model::{Notification, NotificationCounts};

/// Terminal status of a resolved correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// The workflow engine completed the action.
    Success,
    /// The workflow engine reported a business failure.
    Error,
}

/// One framed event on the push connection.
///
/// Each variant maps to a named event on the wire; the payload is the
/// JSON-serialized variant body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEvent {
    /// Connection established.
    Welcome {
        /// The session this connection serves.
        session_id: SessionId,
        /// Server-side connection timestamp.
        connected_at: DateTime<Utc>,
    },
    /// Aggregate snapshot; replaces the client's counts wholesale.
    Counts(NotificationCounts),
    /// A new notification, full record.
    Notification(Box<Notification>),
    /// A notification's required action was performed.
    ActionCompleted {
        /// The notification whose action completed.
        notification_id: NotificationId,
    },
    /// An in-flight action resolved, addressed to the initiating session.
    CorrelationResolved {
        /// The token the action was registered under.
        #[serde(rename = "correlationId")]
        correlation_id: CorrelationId,
        /// Terminal outcome.
        status: ResolutionStatus,
    },
    /// Periodic keep-alive frame.
    Heartbeat {
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PushEvent {
    /// The wire-level event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Counts(_) => "counts",
            Self::Notification(_) => "notification",
            Self::ActionCompleted { .. } => "action_completed",
            Self::CorrelationResolved { .. } => "correlation_resolved",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }

    /// The wire-level payload (the variant body, without the variant tag).
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Self::Welcome {
                session_id,
                connected_at,
            } => serde_json::json!({ "session_id": session_id, "connected_at": connected_at }),
            Self::Counts(counts) => serde_json::to_value(counts).unwrap_or_default(),
            Self::Notification(n) => serde_json::to_value(n).unwrap_or_default(),
            Self::ActionCompleted { notification_id } => {
                serde_json::json!({ "notification_id": notification_id })
            }
            Self::CorrelationResolved {
                correlation_id,
                status,
            } => serde_json::json!({ "correlationId": correlation_id, "status": status }),
            Self::Heartbeat { timestamp } => serde_json::json!({ "timestamp": timestamp }),
        };
        value
    }

    /// A heartbeat frame stamped now.
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(PushEvent::heartbeat().event_name(), "heartbeat");
        let resolved = PushEvent::CorrelationResolved {
            correlation_id: CorrelationId::from("c1"),
            status: ResolutionStatus::Error,
        };
        assert_eq!(resolved.event_name(), "correlation_resolved");
    }

    #[test]
    fn test_resolution_payload_shape() {
        let resolved = PushEvent::CorrelationResolved {
            correlation_id: CorrelationId::from("c1"),
            status: ResolutionStatus::Success,
        };
        let payload = resolved.payload();
        assert_eq!(payload["correlationId"], "c1");
        assert_eq!(payload["status"], "success");
    }
}
