//! Seam to the external workflow engine.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use forma_core::config::dispatch::DispatchConfig;
use forma_core::error::AppError;
use forma_core::result::AppResult;

use crate::types::ActionRequest;

/// Outbound port to the automation system that actually performs the
/// business action. The forward is fire-and-forget: a `2xx` only means
/// the engine accepted the work, never that the action completed.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Hands one action over to the engine.
    async fn submit(&self, request: &ActionRequest) -> AppResult<()>;
}

/// HTTP implementation posting the action payload to the engine's webhook.
#[derive(Debug, Clone)]
pub struct HttpWorkflowEngine {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Webhook URL of the engine.
    url: String,
}

impl HttpWorkflowEngine {
    /// Creates an engine client from configuration.
    pub fn new(config: &DispatchConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.forward_timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.engine_url.clone(),
        })
    }
}

#[async_trait]
impl WorkflowEngine for HttpWorkflowEngine {
    async fn submit(&self, request: &ActionRequest) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::dispatch(format!("Workflow engine unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::dispatch(format!(
                "Workflow engine rejected the action: HTTP {}",
                response.status()
            )));
        }

        debug!(
            correlation_id = %request.correlation_id,
            action_type = %request.action_type,
            "Action forwarded to workflow engine"
        );
        Ok(())
    }
}
