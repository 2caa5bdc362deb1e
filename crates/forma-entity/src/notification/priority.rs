//! Notification priority levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::impl_sqlx_text;

/// Priority of a notification.
///
/// `Urgente` additionally triggers a native OS-level alert on the client
/// on top of the in-app display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationPriority {
    /// Low priority, informational only.
    #[serde(rename = "BASSE")]
    Basse,
    /// Default priority.
    #[serde(rename = "NORMALE")]
    Normale,
    /// High priority, highlighted in the list view.
    #[serde(rename = "HAUTE")]
    Haute,
    /// Urgent, raises a native alert on the client.
    #[serde(rename = "URGENTE")]
    Urgente,
}

impl NotificationPriority {
    /// Return the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basse => "BASSE",
            Self::Normale => "NORMALE",
            Self::Haute => "HAUTE",
            Self::Urgente => "URGENTE",
        }
    }

    /// Whether this priority raises a native client alert.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Urgente)
    }
}

impl Default for NotificationPriority {
    fn default() -> Self {
        Self::Normale
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown priority string.
#[derive(Debug, thiserror::Error)]
#[error("unknown notification priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for NotificationPriority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASSE" => Ok(Self::Basse),
            "NORMALE" => Ok(Self::Normale),
            "HAUTE" => Ok(Self::Haute),
            "URGENTE" => Ok(Self::Urgente),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

impl_sqlx_text!(NotificationPriority);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_roundtrip() {
        for p in [
            NotificationPriority::Basse,
            NotificationPriority::Normale,
            NotificationPriority::Haute,
            NotificationPriority::Urgente,
        ] {
            assert_eq!(p.as_str().parse::<NotificationPriority>().unwrap(), p);
        }
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&NotificationPriority::Urgente).unwrap();
        assert_eq!(json, "\"URGENTE\"");
    }

    #[test]
    fn test_only_urgente_is_urgent() {
        assert!(NotificationPriority::Urgente.is_urgent());
        assert!(!NotificationPriority::Haute.is_urgent());
    }
}
