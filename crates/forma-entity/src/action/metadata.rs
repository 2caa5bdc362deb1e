//! Typed action metadata payloads.
//!
//! The `metadonnees` field of an action request is free-form on the wire,
//! but its expected shape is determined by the action type. Each action's
//! fields are therefore statically enumerable here, with an escape hatch
//! for action types this build does not know yet.

use serde::{Deserialize, Serialize};

use forma_core::{AppError, AppResult};

use super::types::ActionType;

/// Metadata for [`ActionType::EnvoyerEmail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvoyerEmailMeta {
    /// Email template identifier.
    pub modele: String,
    /// Recipient address.
    pub destinataire: String,
    /// Subject line override.
    #[serde(default)]
    pub objet: Option<String>,
}

/// Metadata for [`ActionType::GenererDevis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenererDevisMeta {
    /// Pre-tax amount.
    pub montant_ht: f64,
    /// VAT percentage.
    #[serde(default = "default_tva")]
    pub tva_pct: f64,
    /// Quote reference.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Metadata for [`ActionType::ConvertirCandidat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertirCandidatMeta {
    /// Target session the candidate joins.
    pub session_cible: i64,
    /// Free-form conversion note.
    #[serde(default)]
    pub motif: Option<String>,
}

/// Metadata for [`ActionType::Refuser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefuserMeta {
    /// Rejection reason shown to the contact.
    pub motif: String,
    /// Internal note, never sent outside.
    #[serde(default)]
    pub commentaire_interne: Option<String>,
}

/// Metadata for [`ActionType::Relancer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelancerMeta {
    /// Follow-up channel (`email`, `telephone`, ...).
    pub canal: String,
    /// Due date of the follow-up, ISO 8601.
    #[serde(default)]
    pub echeance: Option<String>,
}

/// Typed view over the free-form `metadonnees` payload, keyed by action type.
///
/// Untagged on the wire: the payload stays the bare field object. Each
/// variant has a required field the others lack, so matching stays
/// unambiguous; [`ActionMetadata::from_parts`] is still the preferred
/// entry point because it validates against the declared action type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionMetadata {
    /// Email dispatch parameters.
    EnvoyerEmail(EnvoyerEmailMeta),
    /// Quote generation parameters.
    GenererDevis(GenererDevisMeta),
    /// Candidate conversion parameters.
    ConvertirCandidat(ConvertirCandidatMeta),
    /// Rejection parameters.
    Refuser(RefuserMeta),
    /// Follow-up parameters.
    Relancer(RelancerMeta),
}

impl ActionMetadata {
    /// Parse the raw wire payload against the shape expected by `action_type`.
    pub fn from_parts(action_type: ActionType, raw: serde_json::Value) -> AppResult<Self> {
        let parsed = match action_type {
            ActionType::EnvoyerEmail => serde_json::from_value(raw).map(Self::EnvoyerEmail),
            ActionType::GenererDevis => serde_json::from_value(raw).map(Self::GenererDevis),
            ActionType::ConvertirCandidat => {
                serde_json::from_value(raw).map(Self::ConvertirCandidat)
            }
            ActionType::Refuser => serde_json::from_value(raw).map(Self::Refuser),
            ActionType::Relancer => serde_json::from_value(raw).map(Self::Relancer),
        };
        parsed.map_err(|e| {
            AppError::validation(format!("Invalid metadonnees for {action_type}: {e}"))
        })
    }

    /// The action type this payload belongs to.
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::EnvoyerEmail(_) => ActionType::EnvoyerEmail,
            Self::GenererDevis(_) => ActionType::GenererDevis,
            Self::ConvertirCandidat(_) => ActionType::ConvertirCandidat,
            Self::Refuser(_) => ActionType::Refuser,
            Self::Relancer(_) => ActionType::Relancer,
        }
    }

    /// Render back to the free-form wire shape.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Self::EnvoyerEmail(m) => serde_json::to_value(m),
            Self::GenererDevis(m) => serde_json::to_value(m),
            Self::ConvertirCandidat(m) => serde_json::to_value(m),
            Self::Refuser(m) => serde_json::to_value(m),
            Self::Relancer(m) => serde_json::to_value(m),
        }
        .unwrap_or(serde_json::Value::Null)
    }
}

fn default_tva() -> f64 {
    20.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refuser_from_wire() {
        let raw = json!({ "motif": "profil incomplet" });
        let meta = ActionMetadata::from_parts(ActionType::Refuser, raw).unwrap();
        assert_eq!(meta.action_type(), ActionType::Refuser);
        match meta {
            ActionMetadata::Refuser(r) => {
                assert_eq!(r.motif, "profil incomplet");
                assert!(r.commentaire_interne.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let raw = json!({ "destinataire": "a@b.fr" });
        let err = ActionMetadata::from_parts(ActionType::EnvoyerEmail, raw).unwrap_err();
        assert_eq!(err.kind, forma_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_devis_defaults() {
        let raw = json!({ "montant_ht": 1200.0 });
        let meta = ActionMetadata::from_parts(ActionType::GenererDevis, raw).unwrap();
        match meta {
            ActionMetadata::GenererDevis(d) => assert_eq!(d.tva_pct, 20.0),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_wire_roundtrip() {
        let meta = ActionMetadata::Relancer(RelancerMeta {
            canal: "email".to_string(),
            echeance: Some("2026-09-01".to_string()),
        });
        let wire = meta.to_wire();
        let back = ActionMetadata::from_parts(ActionType::Relancer, wire).unwrap();
        assert_eq!(back, meta);
    }
}
