//! REST fallback client.
//!
//! Initial loads, refreshes after reconnects, and read-state mutations go
//! over plain request/response calls; the push connection only carries
//! server-initiated events.

use serde::{Deserialize, Serialize};

use forma_core::error::AppError;
use forma_core::result::AppResult;
use forma_core::types::id::{CorrelationId, NotificationId};
use forma_core::types::pagination::PageResponse;
use forma_entity::action::types::ActionType;
use forma_entity::notification::model::{Notification, NotificationCounts};

use crate::config::ClientConfig;

/// Wire shape of the action trigger request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAction {
    /// Caller-generated correlation token.
    pub correlation_id: CorrelationId,
    /// The business action to perform.
    pub action_type: ActionType,
    /// UI provenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_source: Option<String>,
    /// Entity type the action concerns.
    pub entite_type: String,
    /// Entity identifier the action concerns.
    pub entite_id: i64,
    /// Decision carried by the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_type: Option<String>,
    /// Free-form operator comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentaire: Option<String>,
    /// Action-specific payload.
    pub metadonnees: serde_json::Value,
    /// Response handling configuration.
    pub response_config: TriggerResponseConfig,
}

/// Response configuration of a trigger request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponseConfig {
    /// Tag the workflow engine echoes in its callback.
    pub expected_response: String,
    /// Bounded wait in seconds.
    pub timeout_seconds: u64,
}

/// Acknowledgement returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAck {
    /// The correlation token the resolution will carry.
    pub correlation_id: CorrelationId,
    /// Seconds the caller should wait before giving up.
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: T,
}

/// Thin HTTP client for the notification and action endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl RestClient {
    /// Creates a client from configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.config.base_url, path))
            .header("x-forma-user", self.config.user_id.to_string())
            .header("x-forma-session", self.config.session_id.to_string())
            .header("x-forma-name", &self.config.display_name)
            .header("x-forma-groups", self.config.groups.join(","))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = match status.as_u16() {
                409 => AppError::conflict(body),
                400 => AppError::validation(body),
                _ => AppError::service_unavailable(format!("HTTP {status}: {body}")),
            };
            return Err(err);
        }
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AppError::validation(format!("Malformed response: {e}")))?;
        Ok(envelope.data)
    }

    /// Fetches one page of notifications.
    pub async fn fetch_notifications(
        &self,
        page: u64,
        page_size: u64,
    ) -> AppResult<PageResponse<Notification>> {
        let response = self
            .request(reqwest::Method::GET, "/api/notifications")
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Fetch failed: {e}")))?;
        Self::read_json(response).await
    }

    /// Fetches the current aggregate counts.
    pub async fn fetch_counts(&self) -> AppResult<NotificationCounts> {
        let response = self
            .request(reqwest::Method::GET, "/api/notifications/counts")
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Fetch failed: {e}")))?;
        Self::read_json(response).await
    }

    /// Marks one notification as read.
    pub async fn mark_read(&self, id: NotificationId) -> AppResult<()> {
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/notifications/{id}/read"),
            )
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Request failed: {e}")))?;
        Self::read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Marks everything read.
    pub async fn mark_all_read(&self) -> AppResult<()> {
        let response = self
            .request(reqwest::Method::PUT, "/api/notifications/read-all")
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Request failed: {e}")))?;
        Self::read_json::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Triggers an action and returns the gateway acknowledgement.
    pub async fn trigger_action(&self, action: &TriggerAction) -> AppResult<TriggerAck> {
        let response = self
            .request(reqwest::Method::POST, "/api/actions/trigger")
            .json(action)
            .send()
            .await
            .map_err(|e| AppError::service_unavailable(format!("Request failed: {e}")))?;
        Self::read_json(response).await
    }
}
