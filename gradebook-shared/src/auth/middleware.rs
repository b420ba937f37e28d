/// Request authentication context and bearer extraction
///
/// The API layer wraps protected routes in a middleware that pulls the
/// bearer token from the `Authorization` header, validates it, and inserts
/// an [`AuthContext`] into the request extensions. Handlers read the context
/// back out with axum's `Extension` extractor; if the middleware rejected
/// the request, the handler never runs.
///
/// All failures map to the same 401 response body so the client cannot tell
/// a missing token from a stale one; the distinct reason is logged at debug
/// level.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::token::{Claims, TokenError};
use crate::models::user::Role;

/// Authenticated identity attached to a request
///
/// Built from validated token claims only; carries no database state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id
    pub user_id: i64,

    /// Account email from the token
    pub email: String,

    /// Username from the token
    pub username: String,

    /// Role claim
    pub role: Role,
}

impl AuthContext {
    /// Builds the context from validated claims
    ///
    /// Fails only if the subject claim is not a string-encoded integer,
    /// which a token we issued ourselves cannot produce.
    pub fn from_claims(claims: &Claims) -> Result<Self, TokenError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.clone(),
            username: claims.name.clone(),
            role: claims.role,
        })
    }
}

/// Error type for request authentication
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header on the request
    MissingCredentials,

    /// Authorization header present but not `Bearer <token>`
    InvalidFormat,

    /// Token failed validation
    InvalidToken(TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // One body for every variant; the reason stays server-side.
        match &self {
            AuthError::MissingCredentials => tracing::debug!("auth rejected: missing credentials"),
            AuthError::InvalidFormat => tracing::debug!("auth rejected: bad authorization format"),
            AuthError::InvalidToken(e) => tracing::debug!("auth rejected: {}", e),
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "success": false,
                "message": "Unauthorized",
            })),
        )
            .into_response()
    }
}

/// Extracts the bearer token from a request's Authorization header
pub fn bearer_token(req: &Request) -> Result<&str, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)
}
