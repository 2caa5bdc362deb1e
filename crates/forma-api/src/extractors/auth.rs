//! `AuthSession` extractor — builds the request context from the identity
//! headers forwarded by the authentication front.
//!
//! Session management itself is an external collaborator: requests arrive
//! with the already-verified identity in `X-Forma-*` headers, and this
//! extractor only translates them into a [`RequestContext`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use forma_core::error::AppError;
use forma_core::types::id::{SessionId, UserId};
use forma_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated session context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthSession(pub RequestContext);

impl AuthSession {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthSession {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id: UserId = header(parts, "x-forma-user")?
            .parse()
            .map_err(|_| auth_error("Malformed X-Forma-User header"))?;

        let session_id: SessionId = header(parts, "x-forma-session")?
            .parse()
            .map_err(|_| auth_error("Malformed X-Forma-Session header"))?;

        let display_name = parts
            .headers
            .get("x-forma-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("inconnu")
            .to_string();

        let groups = parts
            .headers
            .get("x-forma-groups")
            .and_then(|v| v.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(AuthSession(RequestContext::new(
            user_id,
            session_id,
            display_name,
            groups,
        )))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| auth_error(format!("Missing {name} header")))
}

fn auth_error(message: impl Into<String>) -> ApiError {
    ApiError(AppError::authentication(message))
}
