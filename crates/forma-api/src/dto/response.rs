//! Outbound response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always `true` for this envelope.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wraps a payload in the success envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Row-count payload for bulk mutations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of rows affected.
    pub count: u64,
}
