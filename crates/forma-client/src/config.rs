//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use forma_core::types::id::{SessionId, UserId};

/// Configuration for the push consumer and REST fallback client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Forma server (e.g. `http://localhost:8080`).
    pub base_url: String,
    /// Authenticated user identity.
    pub user_id: UserId,
    /// Browser session identity.
    pub session_id: SessionId,
    /// Display name forwarded with requests.
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Role groups the identity belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Fixed backoff before a reconnection attempt, in seconds.
    #[serde(default = "default_backoff")]
    pub reconnect_backoff_seconds: u64,
    /// Default bounded wait for action correlations, in seconds.
    #[serde(default = "default_action_timeout")]
    pub default_action_timeout_seconds: u64,
}

impl ClientConfig {
    /// Fixed reconnection backoff.
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_seconds)
    }

    /// Default correlation wait.
    pub fn default_action_timeout(&self) -> Duration {
        Duration::from_secs(self.default_action_timeout_seconds)
    }
}

fn default_display_name() -> String {
    "client".to_string()
}

fn default_backoff() -> u64 {
    5
}

fn default_action_timeout() -> u64 {
    60
}
