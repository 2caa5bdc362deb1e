//! Action type enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::notification::impl_sqlx_text;

/// The kind of business action handed off to the external workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Send a templated email to a contact.
    #[serde(rename = "ENVOYER_EMAIL")]
    EnvoyerEmail,
    /// Generate a PDF quote for a prospect.
    #[serde(rename = "GENERER_DEVIS")]
    GenererDevis,
    /// Convert a candidate into a session attendee.
    #[serde(rename = "CONVERTIR_CANDIDAT")]
    ConvertirCandidat,
    /// Reject a candidate or a prospect request.
    #[serde(rename = "REFUSER")]
    Refuser,
    /// Schedule a follow-up reminder.
    #[serde(rename = "RELANCER")]
    Relancer,
}

impl ActionType {
    /// Return the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnvoyerEmail => "ENVOYER_EMAIL",
            Self::GenererDevis => "GENERER_DEVIS",
            Self::ConvertirCandidat => "CONVERTIR_CANDIDAT",
            Self::Refuser => "REFUSER",
            Self::Relancer => "RELANCER",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown action type string.
#[derive(Debug, thiserror::Error)]
#[error("unknown action type: {0}")]
pub struct ParseActionTypeError(String);

impl FromStr for ActionType {
    type Err = ParseActionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENVOYER_EMAIL" => Ok(Self::EnvoyerEmail),
            "GENERER_DEVIS" => Ok(Self::GenererDevis),
            "CONVERTIR_CANDIDAT" => Ok(Self::ConvertirCandidat),
            "REFUSER" => Ok(Self::Refuser),
            "RELANCER" => Ok(Self::Relancer),
            other => Err(ParseActionTypeError(other.to_string())),
        }
    }
}

impl_sqlx_text!(ActionType);
