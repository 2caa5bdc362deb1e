//! Notification category enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::impl_sqlx_text;

/// Category of a notification, used for filtering and icon/color selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Result of a user-initiated action (email sent, quote generated, ...).
    Action,
    /// Prospect and sales pipeline events.
    Commercial,
    /// Candidate pipeline events.
    Recrutement,
    /// Trainer and session planning events.
    Planning,
    /// System-level events.
    Systeme,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Commercial => "commercial",
            Self::Recrutement => "recrutement",
            Self::Planning => "planning",
            Self::Systeme => "systeme",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown category string.
#[derive(Debug, thiserror::Error)]
#[error("unknown notification category: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for NotificationCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Self::Action),
            "commercial" => Ok(Self::Commercial),
            "recrutement" => Ok(Self::Recrutement),
            "planning" => Ok(Self::Planning),
            "systeme" => Ok(Self::Systeme),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

impl_sqlx_text!(NotificationCategory);
