//! Action dispatch and correlation registry configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the action dispatch gateway and correlation registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Base URL of the external workflow engine.
    #[serde(default = "default_engine_url")]
    pub engine_url: String,
    /// HTTP timeout for the outbound forward call, in seconds.
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_seconds: u64,
    /// Default correlation timeout applied when a request does not carry one.
    #[serde(default = "default_timeout")]
    pub default_timeout_seconds: u64,
    /// Interval between registry sweep passes, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            forward_timeout_seconds: default_forward_timeout(),
            default_timeout_seconds: default_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_engine_url() -> String {
    "http://localhost:5678/webhook/forma-actions".to_string()
}

fn default_forward_timeout() -> u64 {
    10
}

fn default_timeout() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    5
}
