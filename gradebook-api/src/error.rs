/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; the error converts into an HTTP
/// response carrying the `{success: false, message, ...}` envelope every
/// endpoint uses. Authentication failures collapse into generic messages at
/// this boundary (the distinct reasons live in the auth error types and the
/// logs); validation failures keep their specific per-field messages.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) — e.g. a spent or unknown reset ticket
    BadRequest(String),

    /// Unauthorized (401) — always the generic message
    Unauthorized(String),

    /// Forbidden (403) — authenticated but wrong role
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) — duplicate email/username
    Conflict(String),

    /// Unprocessable entity (422) — request validation failures
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false on the error path
    pub success: bool,

    /// Human-readable message
    pub message: String,

    /// Per-field validation details, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::ValidationError(errors) => {
                // Surface the first failing field's message in the envelope;
                // the full list rides along in `details`.
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique-index violations from the registration race surface as the same
/// conflict messages the pre-insert checks produce.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered.".to_string());
                    }
                    if constraint.contains("username") {
                        return ApiError::Conflict("Username already taken.".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert password hashing errors to API errors
///
/// A verification mismatch is not an error at all; anything that does error
/// out of the hasher is a server-side problem.
impl From<gradebook_shared::auth::password::PasswordError> for ApiError {
    fn from(err: gradebook_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
///
/// Every token failure collapses to the same 401; the variant is logged.
impl From<gradebook_shared::auth::token::TokenError> for ApiError {
    fn from(err: gradebook_shared::auth::token::TokenError) -> Self {
        tracing::debug!("token rejected: {}", err);
        ApiError::Unauthorized("Unauthorized".to_string())
    }
}

/// Convert authorization errors to API errors
impl From<gradebook_shared::auth::authorization::AuthzError> for ApiError {
    fn from(err: gradebook_shared::auth::authorization::AuthzError) -> Self {
        tracing::debug!("authorization rejected: {}", err);
        ApiError::Forbidden("Insufficient permissions".to_string())
    }
}
