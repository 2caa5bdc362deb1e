//! Visibility scope of a notification.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use forma_core::types::id::UserId;

use super::impl_sqlx_text;

/// Role group name that broadcasts to every connected session.
pub const GROUPE_TOUS: &str = "TOUS";

/// Visibility scope of a notification: a single user, or a named role group.
///
/// The wire (and column) format is `user:<uuid>` for a single user and the
/// bare group name otherwise. The literal group `TOUS` addresses every
/// connected session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    /// A single user across all their sessions.
    User(UserId),
    /// A named role group (`COMMERCIAL`, `RECRUTEUR`, ... or `TOUS`).
    Groupe(String),
}

impl Audience {
    /// Audience addressing every connected session.
    pub fn tous() -> Self {
        Self::Groupe(GROUPE_TOUS.to_string())
    }

    /// Whether this audience addresses every connected session.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Groupe(g) if g == GROUPE_TOUS)
    }

    /// Whether the given user is part of this audience.
    ///
    /// Group membership is resolved by the broadcaster; this only answers
    /// the single-user and `TOUS` cases.
    pub fn targets_user(&self, user_id: UserId) -> bool {
        match self {
            Self::User(id) => *id == user_id,
            Self::Groupe(g) => g == GROUPE_TOUS,
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Groupe(name) => write!(f, "{name}"),
        }
    }
}

/// Error returned when parsing a malformed audience string.
#[derive(Debug, thiserror::Error)]
#[error("malformed audience: {0}")]
pub struct ParseAudienceError(String);

impl FromStr for Audience {
    type Err = ParseAudienceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(raw) = s.strip_prefix("user:") {
            let uuid = Uuid::parse_str(raw).map_err(|_| ParseAudienceError(s.to_string()))?;
            return Ok(Self::User(UserId::from_uuid(uuid)));
        }
        if s.is_empty() {
            return Err(ParseAudienceError(s.to_string()));
        }
        Ok(Self::Groupe(s.to_string()))
    }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

impl_sqlx_text!(Audience);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_roundtrip() {
        let user = UserId::new();
        let audience = Audience::User(user);
        let parsed: Audience = audience.to_string().parse().unwrap();
        assert_eq!(parsed, audience);
        assert!(audience.targets_user(user));
        assert!(!audience.targets_user(UserId::new()));
    }

    #[test]
    fn test_groupe_roundtrip() {
        let audience: Audience = "COMMERCIAL".parse().unwrap();
        assert_eq!(audience, Audience::Groupe("COMMERCIAL".to_string()));
        assert!(!audience.is_broadcast());
    }

    #[test]
    fn test_tous_is_broadcast() {
        let audience: Audience = "TOUS".parse().unwrap();
        assert!(audience.is_broadcast());
        assert!(audience.targets_user(UserId::new()));
    }

    #[test]
    fn test_malformed_user_rejected() {
        assert!("user:not-a-uuid".parse::<Audience>().is_err());
        assert!("".parse::<Audience>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let audience = Audience::tous();
        assert_eq!(serde_json::to_string(&audience).unwrap(), "\"TOUS\"");
    }
}
