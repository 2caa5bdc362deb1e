//! Producer of a notification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::impl_sqlx_text;

/// Who or what produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAgent {
    /// A human operator acting in the CRM.
    Operateur,
    /// The external workflow engine.
    Automatisation,
    /// Internal scheduled jobs and system events.
    Systeme,
}

impl SourceAgent {
    /// Return the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operateur => "operateur",
            Self::Automatisation => "automatisation",
            Self::Systeme => "systeme",
        }
    }
}

impl fmt::Display for SourceAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown source string.
#[derive(Debug, thiserror::Error)]
#[error("unknown source agent: {0}")]
pub struct ParseSourceError(String);

impl FromStr for SourceAgent {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operateur" => Ok(Self::Operateur),
            "automatisation" => Ok(Self::Automatisation),
            "systeme" => Ok(Self::Systeme),
            other => Err(ParseSourceError(other.to_string())),
        }
    }
}

impl_sqlx_text!(SourceAgent);
