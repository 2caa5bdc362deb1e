//! Push connection (event stream) configuration.

use serde::{Deserialize, Serialize};

/// Event stream engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Interval between `heartbeat` events on each open connection, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Interval between pushed `counts` snapshots, in seconds.
    #[serde(default = "default_counts_refresh_interval")]
    pub counts_refresh_interval_seconds: u64,
    /// Per-connection outbound queue capacity.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum simultaneous push connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            counts_refresh_interval_seconds: default_counts_refresh_interval(),
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_counts_refresh_interval() -> u64 {
    60
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}
