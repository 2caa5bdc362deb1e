//! Inbound request DTOs.

use serde::Deserialize;
use validator::Validate;

use forma_core::error::AppError;
use forma_core::result::AppResult;
use forma_core::types::id::CorrelationId;
use forma_dispatch::types::{ActionRequest, EntityRef, ResponseConfig};
use forma_entity::action::metadata::ActionMetadata;
use forma_entity::action::types::ActionType;
use forma_entity::notification::audience::Audience;
use forma_entity::notification::category::NotificationCategory;
use forma_entity::notification::priority::NotificationPriority;

/// Raw action trigger request as posted by the UI.
///
/// `metadonnees` stays free-form at this level and is typed against the
/// declared action type during conversion.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerActionRequest {
    /// Caller-generated correlation token.
    #[validate(length(min = 8, message = "correlationId is too short"))]
    pub correlation_id: String,
    /// The business action to perform.
    pub action_type: ActionType,
    /// UI provenance, informational only.
    #[serde(default)]
    pub action_source: Option<String>,
    /// UI provenance, informational only.
    #[serde(default)]
    pub action_button: Option<String>,
    /// Entity type the action concerns.
    #[validate(length(min = 1, message = "entiteType is required"))]
    pub entite_type: String,
    /// Entity identifier the action concerns.
    #[validate(range(min = 1, message = "entiteId must be positive"))]
    pub entite_id: i64,
    /// Denormalized entity snapshot for the engine's convenience.
    #[serde(default)]
    pub entite_data: Option<serde_json::Value>,
    /// Decision carried by the action.
    #[serde(default)]
    pub decision_type: Option<String>,
    /// Free-form operator comment.
    #[serde(default)]
    pub commentaire: Option<String>,
    /// Action-specific payload, shape determined by `action_type`.
    #[serde(default)]
    pub metadonnees: serde_json::Value,
    /// Response handling configuration.
    pub response_config: ResponseConfigDto,
    /// Optional broadcast audience for the outcome notification.
    #[serde(default)]
    pub audience: Option<Audience>,
}

/// Response configuration DTO.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfigDto {
    /// Tag the workflow engine echoes in its callback.
    pub expected_response: String,
    /// Bounded wait in seconds (0 = server default).
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl TriggerActionRequest {
    /// Validates the DTO and types the metadata against the action type.
    pub fn into_action_request(self) -> AppResult<ActionRequest> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid action request: {e}")))?;

        let metadonnees = ActionMetadata::from_parts(self.action_type, self.metadonnees)?;

        Ok(ActionRequest {
            correlation_id: CorrelationId::from(self.correlation_id),
            action_type: self.action_type,
            action_source: self.action_source,
            action_button: self.action_button,
            entite: EntityRef {
                entite_type: self.entite_type,
                entite_id: self.entite_id,
            },
            entite_data: self.entite_data,
            decision_type: self.decision_type,
            commentaire: self.commentaire,
            metadonnees,
            response: ResponseConfig {
                expected_response: self.response_config.expected_response,
                timeout_seconds: self.response_config.timeout_seconds,
            },
            audience: self.audience,
        })
    }
}

/// Query-string filters for the notification list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListQuery {
    /// Restrict to one category.
    #[serde(default)]
    pub categorie: Option<NotificationCategory>,
    /// Restrict to one priority.
    #[serde(default)]
    pub priorite: Option<NotificationPriority>,
    /// Only unread rows.
    #[serde(default)]
    pub non_lues: bool,
    /// Page number (1-based).
    #[serde(default)]
    pub page: Option<u64>,
    /// Items per page.
    #[serde(default)]
    pub page_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::error::ErrorKind;
    use serde_json::json;

    fn dto(metadonnees: serde_json::Value) -> TriggerActionRequest {
        serde_json::from_value(json!({
            "correlationId": "3f2c9a10-aaaa",
            "actionType": "REFUSER",
            "entiteType": "candidat",
            "entiteId": 42,
            "metadonnees": metadonnees,
            "responseConfig": { "expectedResponse": "refus_traite", "timeoutSeconds": 60 }
        }))
        .unwrap()
    }

    #[test]
    fn test_conversion_types_the_metadata() {
        let request = dto(json!({ "motif": "profil incomplet" }))
            .into_action_request()
            .unwrap();
        assert_eq!(request.metadonnees.action_type(), ActionType::Refuser);
        assert_eq!(request.response.timeout_seconds, 60);
    }

    #[test]
    fn test_mismatched_metadata_rejected() {
        let err = dto(json!({ "canal": "email" }))
            .into_action_request()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_short_correlation_id_rejected() {
        let mut raw = dto(json!({ "motif": "x" }));
        raw.correlation_id = "c1".to_string();
        let err = raw.into_action_request().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
