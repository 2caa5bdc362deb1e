//! Action dispatch gateway.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use forma_core::config::dispatch::DispatchConfig;
use forma_core::error::AppError;
use forma_core::result::AppResult;
use forma_service::context::RequestContext;

use crate::engine::WorkflowEngine;
use crate::registry::{CorrelationKey, CorrelationRegistry, PendingCorrelation};
use crate::types::{ActionRequest, DispatchAck};

/// Receives action requests, rejects duplicates, and forwards accepted
/// actions to the external workflow engine.
///
/// The forward is fire-and-forget: once accepted, the caller learns the
/// business outcome only through the push channel (or its own timeout).
/// The single exception is a failed forward, reported synchronously after
/// the fresh registration is rolled back.
pub struct ActionDispatchGateway {
    /// Correlation registry (shared with the callback processor).
    registry: Arc<CorrelationRegistry>,
    /// Outbound port to the workflow engine.
    engine: Arc<dyn WorkflowEngine>,
    /// Configuration.
    config: DispatchConfig,
}

impl std::fmt::Debug for ActionDispatchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatchGateway").finish()
    }
}

impl ActionDispatchGateway {
    /// Creates a new gateway.
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        engine: Arc<dyn WorkflowEngine>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            engine,
            config,
        }
    }

    /// Handles one action trigger.
    pub async fn trigger(
        &self,
        ctx: &RequestContext,
        request: ActionRequest,
    ) -> AppResult<DispatchAck> {
        validate(&request)?;

        let timeout_seconds = if request.response.timeout_seconds == 0 {
            self.config.default_timeout_seconds
        } else {
            request.response.timeout_seconds
        };

        let key = CorrelationKey {
            entite_type: request.entite.entite_type.clone(),
            entite_id: request.entite.entite_id,
            action_type: request.action_type,
        };

        let pending = PendingCorrelation {
            correlation_id: request.correlation_id.clone(),
            key: key.clone(),
            owner_user_id: ctx.user_id,
            owner_session_id: ctx.session_id,
            audience: request.audience.clone(),
            registered_at: Instant::now(),
            timeout: Duration::from_secs(timeout_seconds),
        };

        if let Err(conflict) = self.registry.register(pending) {
            warn!(
                key = %key,
                existing = %conflict.existing,
                remaining_s = conflict.remaining.as_secs(),
                "Duplicate action rejected"
            );
            return Err(AppError::conflict(format!(
                "Action {} already in progress for {} {} (about {}s remaining)",
                key.action_type,
                key.entite_type,
                key.entite_id,
                conflict.remaining.as_secs()
            )));
        }

        // Forward failure is the one synchronous outcome: roll the fresh
        // registration back so a retry is not blocked by a phantom conflict.
        if let Err(e) = self.engine.submit(&request).await {
            self.registry.evict(&request.correlation_id);
            warn!(
                correlation_id = %request.correlation_id,
                key = %key,
                error = %e,
                "Forward to workflow engine failed, correlation evicted"
            );
            return Err(e);
        }

        info!(
            correlation_id = %request.correlation_id,
            key = %key,
            user_id = %ctx.user_id,
            timeout_s = timeout_seconds,
            "Action accepted and forwarded"
        );

        Ok(DispatchAck {
            correlation_id: request.correlation_id,
            timeout_seconds,
        })
    }
}

/// Field-level checks the typed request cannot enforce on its own.
fn validate(request: &ActionRequest) -> AppResult<()> {
    if request.correlation_id.as_str().trim().is_empty() {
        return Err(AppError::validation("correlationId must not be empty"));
    }
    if request.entite.entite_type.trim().is_empty() {
        return Err(AppError::validation("entiteType must not be empty"));
    }
    if request.entite.entite_id <= 0 {
        return Err(AppError::validation("entiteId must be a positive identifier"));
    }
    if request.metadonnees.action_type() != request.action_type {
        return Err(AppError::validation(
            "metadonnees do not match the declared actionType",
        ));
    }
    Ok(())
}
