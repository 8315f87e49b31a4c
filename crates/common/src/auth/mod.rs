//! Authentication context utilities
//!
//! MailSift does not mint credentials itself: the OAuth flow and token
//! persistence live outside this service. Handlers receive the user's Google
//! access token as a bearer header and pass it through to the mail provider.

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Google OAuth access token, passed through to the mail provider
    pub access_token: String,

    /// Request ID for tracing
    pub request_id: String,
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Extract bearer token
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let access_token = extract_bearer(auth_header)
            .map(String::from)
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthContext {
            access_token,
            request_id,
        })
    }
}
