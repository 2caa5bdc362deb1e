//! Request context carrying the authenticated identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forma_core::types::id::{SessionId, UserId};

/// Context for the current authenticated request.
///
/// Extracted by the API layer from the session headers forwarded by the
/// authentication front (session management itself is an external
/// collaborator) and passed into service methods so that every operation
/// knows *who* is acting and from *which* browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The current browser session ID.
    pub session_id: SessionId,
    /// Display name (convenience field for log lines and notifications).
    pub display_name: String,
    /// Role groups the identity belongs to (`COMMERCIAL`, `RECRUTEUR`, ...).
    pub groups: Vec<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        display_name: String,
        groups: Vec<String>,
    ) -> Self {
        Self {
            user_id,
            session_id,
            display_name,
            groups,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the identity belongs to the given role group.
    pub fn is_member(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_membership() {
        let ctx = RequestContext::new(
            UserId::new(),
            SessionId::new(),
            "Claire".to_string(),
            vec!["COMMERCIAL".to_string()],
        );
        assert!(ctx.is_member("COMMERCIAL"));
        assert!(!ctx.is_member("RECRUTEUR"));
    }
}
