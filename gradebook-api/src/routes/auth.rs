/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an account and get a token
/// - `POST /v1/auth/login` - Authenticate and get a token
/// - `POST /v1/auth/forgot-password` - Request a reset ticket
/// - `POST /v1/auth/reset-password` - Consume a reset ticket
///
/// Registration and login deliberately answer credential failures with one
/// generic message, and forgot-password answers identically whether or not
/// the email exists, so none of these endpoints can be used to enumerate
/// accounts.

use axum::{extract::State, Json};
use chrono::Duration;
use gradebook_shared::{
    auth::{password, token},
    email::Mailer,
    models::{
        password_reset::PasswordResetToken,
        profile::{CreateProfile, Profile},
        user::{CreateUser, Role, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address, normalized to lowercase before any check
    #[validate(email(message = "Invalid email format."))]
    pub email: String,

    /// Username
    #[validate(custom(function = "validate_name"))]
    pub username: String,

    /// Plaintext password, hashed before it touches the database
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    /// Requested role, matched case-insensitively against TEACHER|STUDENT
    pub role: String,

    /// First name
    #[validate(custom(function = "validate_name"))]
    pub first_name: String,

    /// Last name
    #[validate(custom(function = "validate_name"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot password request
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Raw reset token from the emailed link
    pub token: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub new_password: String,

    pub confirm_password: String,
}

/// Identity summary returned with every successful auth response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
}

/// Successful register/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

/// Bare success envelope
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Names must be non-empty and contain no whitespace
fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Field is required.".into());
        return Err(err);
    }
    if value.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("whitespace");
        err.message = Some("Field cannot contain whitespace.".into());
        return Err(err);
    }
    Ok(())
}

/// Collects validator output into the response detail list
fn validation_details(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::ValidationError(details)
}

fn issue_for(state: &AppState, user: &User) -> Result<String, ApiError> {
    let auth = state.auth_config();
    let claims = token::Claims::new(
        user.id,
        &user.email,
        &user.username,
        user.role,
        &auth.issuer,
        &auth.audience,
        auth.token_expiry_hours,
    );
    Ok(token::issue_token(&claims, &auth.jwt_secret)?)
}

fn summarize(user: &User, profile: &Profile) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        role: user.role,
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
    }
}

/// Register a new account
///
/// The checks run in a fixed order: email uniqueness, username uniqueness,
/// role, then field validation. The user and profile rows are written in a
/// single transaction; a concurrent duplicate that slips past the
/// pre-insert checks fails on the unique index and maps to the same
/// conflict message.
///
/// # Errors
///
/// - `409 Conflict`: "Email already registered." / "Username already taken."
/// - `422 Unprocessable Entity`: "Invalid role." or a per-field message
/// - `500 Internal Server Error`: hashing or database failure
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered.".to_string()));
    }

    if User::find_by_username(&state.db, &req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already taken.".to_string()));
    }

    let Some(role) = Role::parse(&req.role) else {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "role".to_string(),
            message: "Invalid role.".to_string(),
        }]));
    };

    req.validate().map_err(validation_details)?;

    let salt = password::generate_salt();
    let password_hash = password::hash_password(&req.password, &salt)?;

    let (user, profile) = User::create_with_profile(
        &state.db,
        CreateUser {
            email,
            username: req.username,
            password_hash,
            salt: password::encode_salt(&salt),
            role,
        },
        CreateProfile {
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, "account registered");

    let token = issue_for(&state, &user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Registration successful.".to_string(),
        token,
        user: summarize(&user, &profile),
    }))
}

/// Login
///
/// Unknown email and wrong password produce the identical response, so the
/// endpoint leaks nothing about which accounts exist. The email is
/// lowercased before lookup, matching the normalization registration
/// applied at write time.
///
/// # Errors
///
/// - `401 Unauthorized`: "Invalid username or password"
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    };

    let salt = password::decode_salt(&user.salt)?;
    if !password::verify_password(&req.password, &user.password_hash, &salt)? {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let profile = Profile::find_by_user(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("user {} has no profile", user.id)))?;

    tracing::info!(user_id = user.id, "login succeeded");

    let token = issue_for(&state, &user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful.".to_string(),
        token,
        user: summarize(&user, &profile),
    }))
}

/// Request a password reset
///
/// Always answers success with the same body, whether or not the email is
/// registered. When it is, a fresh single-use ticket is stored (retiring
/// any older unused one) and the raw token goes out through the mailer;
/// a dispatch failure is logged and never surfaced.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = req.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let ttl = Duration::hours(state.auth_config().reset_token_expiry_hours);
        let (_ticket, raw_token) = PasswordResetToken::create(&state.db, user.id, ttl).await?;

        if let Err(e) = state.mailer.send_password_reset(&user.email, &raw_token).await {
            tracing::warn!(user_id = user.id, "reset email dispatch failed: {}", e);
        }
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "If the email is registered, a password reset link has been sent.".to_string(),
    }))
}

/// Reset a password with a ticket
///
/// The ticket lookup and the credential update happen in one transaction:
/// either the password changes and the ticket is spent, or neither. A
/// second presentation of the same token finds no actionable ticket.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: "Passwords do not match." / empty password
/// - `400 Bad Request`: "Invalid or expired token."
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(validation_details)?;

    if req.new_password != req.confirm_password {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "confirmPassword".to_string(),
            message: "Passwords do not match.".to_string(),
        }]));
    }

    let salt = password::generate_salt();
    let password_hash = password::hash_password(&req.new_password, &salt)?;

    let consumed = PasswordResetToken::consume(
        &state.db,
        &req.token,
        &password_hash,
        &password::encode_salt(&salt),
    )
    .await?;

    let Some(user_id) = consumed else {
        return Err(ApiError::BadRequest("Invalid or expired token.".to_string()));
    };

    tracing::info!(user_id, "password reset completed");

    Ok(Json(MessageResponse {
        success: true,
        message: "Password has been reset.".to_string(),
    }))
}
