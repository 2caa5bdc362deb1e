//! Wire and domain types of the action dispatch protocol.

use serde::{Deserialize, Serialize};

use forma_core::types::id::CorrelationId;
use forma_entity::action::metadata::ActionMetadata;
use forma_entity::action::types::ActionType;
use forma_entity::notification::audience::Audience;

/// Reference to the business object an action concerns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    /// Entity type (`prospect`, `candidat`, `formateur`, `session`).
    pub entite_type: String,
    /// Entity identifier in the CRM store.
    pub entite_id: i64,
}

/// How the caller wants the asynchronous response handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    /// Tag the workflow engine echoes in its callback.
    pub expected_response: String,
    /// Bounded wait applied on both sides of the correlation, in seconds.
    pub timeout_seconds: u64,
}

/// A validated action request, ready for registration and forwarding.
///
/// Serializes to the wire shape the external workflow engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    /// Caller-generated correlation token.
    pub correlation_id: CorrelationId,
    /// The business action to perform.
    pub action_type: ActionType,
    /// UI provenance, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_source: Option<String>,
    /// UI provenance, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_button: Option<String>,
    /// The business object concerned.
    #[serde(flatten)]
    pub entite: EntityRef,
    /// Denormalized entity snapshot for the engine's convenience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entite_data: Option<serde_json::Value>,
    /// Decision carried by the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_type: Option<String>,
    /// Free-form operator comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentaire: Option<String>,
    /// Action-specific payload, typed by action type.
    pub metadonnees: ActionMetadata,
    /// Response handling configuration.
    #[serde(rename = "responseConfig")]
    pub response: ResponseConfig,
    /// Audience the eventual outcome notification should address, when the
    /// action wants a broadcast outcome instead of a personal one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
}

/// Synchronous acknowledgement returned once the action is registered and
/// forwarded. The business outcome arrives later on the push connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchAck {
    /// The correlation token the resolution event will carry.
    pub correlation_id: CorrelationId,
    /// Seconds the caller should wait before giving up.
    pub timeout_seconds: u64,
}

/// Terminal outcome reported by the external workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action completed.
    Success,
    /// The engine reports a business failure.
    Error,
}

/// Asynchronous result delivered by the external workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    /// The token the action was registered under.
    pub correlation_id: CorrelationId,
    /// Terminal outcome.
    pub outcome: ActionOutcome,
    /// Free-form result used to populate the synthesized notification.
    #[serde(default)]
    pub result_payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_entity::action::metadata::RefuserMeta;
    use serde_json::json;

    #[test]
    fn test_action_request_wire_shape() {
        let request = ActionRequest {
            correlation_id: CorrelationId::from("c1"),
            action_type: ActionType::Refuser,
            action_source: Some("fiche_candidat".to_string()),
            action_button: None,
            entite: EntityRef {
                entite_type: "candidat".to_string(),
                entite_id: 42,
            },
            entite_data: None,
            decision_type: Some("REFUS".to_string()),
            commentaire: None,
            metadonnees: ActionMetadata::Refuser(RefuserMeta {
                motif: "profil incomplet".to_string(),
                commentaire_interne: None,
            }),
            response: ResponseConfig {
                expected_response: "refus_traite".to_string(),
                timeout_seconds: 60,
            },
            audience: None,
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["correlationId"], "c1");
        assert_eq!(wire["actionType"], "REFUSER");
        assert_eq!(wire["entiteType"], "candidat");
        assert_eq!(wire["entiteId"], 42);
        assert_eq!(wire["responseConfig"]["timeoutSeconds"], 60);
    }

    #[test]
    fn test_callback_payload_defaults() {
        let payload: CallbackPayload = serde_json::from_value(json!({
            "correlationId": "c1",
            "outcome": "error"
        }))
        .unwrap();
        assert_eq!(payload.outcome, ActionOutcome::Error);
        assert!(payload.result_payload.is_null());
    }
}
