/// Access token issuance and validation
///
/// Tokens are stateless HS256-signed bearer tokens. The server keeps no
/// record of issued tokens; a token is live until its expiry instant and
/// semantically dead afterwards, even though the string stays syntactically
/// valid.
///
/// # Claims
///
/// - `sub`: user id (string-encoded integer)
/// - `email`: account email
/// - `name`: username
/// - `role`: `TEACHER` or `STUDENT`
/// - `iss` / `aud`: issuer and audience, compared exactly (case-sensitive)
/// - `iat` / `exp`: issued-at and expiry, Unix timestamps
///
/// Expiry is always computed server-side from the configured duration;
/// callers never pick an arbitrary expiry instant.
///
/// # Example
///
/// ```
/// use gradebook_shared::auth::token::{issue_token, validate_token, Claims};
/// use gradebook_shared::models::user::Role;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-signing-secret-of-at-least-32-bytes!!";
/// let claims = Claims::new(7, "a@b.com", "alice", Role::Student, "gradebook", "gradebook-web", 24);
/// let token = issue_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret, "gradebook", "gradebook-web")?;
/// assert_eq!(validated.user_id()?, 7);
/// assert_eq!(validated.role, Role::Student);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// Error type for token operations
///
/// The validator returns a tagged failure rather than a bare boolean so the
/// distinct reasons are loggable and testable. The HTTP boundary collapses
/// every variant to a uniform 401.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    Create(String),

    /// Token string was missing a part, undecodable, or carried bad JSON
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Signature did not verify against the configured secret
    #[error("Token signature is invalid")]
    BadSignature,

    /// `exp` is in the past
    #[error("Token has expired")]
    Expired,

    /// `iss` did not equal the configured issuer (exact match)
    #[error("Token issuer mismatch")]
    IssuerMismatch,

    /// `aud` did not equal the configured audience (exact match)
    #[error("Token audience mismatch")]
    AudienceMismatch,

    /// A required claim was absent
    #[error("Token is missing required claim: {0}")]
    MissingClaim(String),
}

/// Signed token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id, string-encoded integer
    pub sub: String,

    /// Account email
    pub email: String,

    /// Username
    pub name: String,

    /// Account role
    pub role: Role,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `expiry_hours` from now
    ///
    /// The expiry is computed here, at issuance time, from the configured
    /// duration. Secret, issuer and audience are process-wide configuration
    /// passed in explicitly; nothing in this module reads global state.
    pub fn new(
        user_id: i64,
        email: &str,
        username: &str,
        role: Role,
        issuer: &str,
        audience: &str,
        expiry_hours: i64,
    ) -> Self {
        Self::with_expiry(
            user_id,
            email,
            username,
            role,
            issuer,
            audience,
            Duration::hours(expiry_hours),
        )
    }

    /// Creates claims with an explicit time-to-live
    ///
    /// Exists for expiry tests; production issuance goes through
    /// [`Claims::new`] with the configured hour count.
    pub fn with_expiry(
        user_id: i64,
        email: &str,
        username: &str,
        role: Role,
        issuer: &str,
        audience: &str,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: username.to_string(),
            role,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Parses the subject claim back into the user id
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| TokenError::Malformed(format!("subject is not an integer: {}", self.sub)))
    }

    /// Checks whether the expiry instant has passed
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact token string
///
/// Uses HS256 (HMAC-SHA256). The secret should be at least 32 bytes and is
/// enforced as such by the server configuration.
///
/// # Errors
///
/// Returns `TokenError::Create` if encoding fails.
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| TokenError::Create(e.to_string()))
}

/// Validates a token and extracts its claims
///
/// Verifies, in order of what `jsonwebtoken` reports first:
/// - the signature against `secret`
/// - `exp` against the current time
/// - `iss` equals `issuer` and `aud` equals `audience`, both exact and
///   case-sensitive
/// - the required claims (`exp`, `iss`, `aud`) are present
///
/// Purely a decision over the token content and the wall clock; performs no
/// I/O and mutates nothing.
///
/// # Errors
///
/// One [`TokenError`] variant per distinct failure; see the type docs.
pub fn validate_token(
    token: &str,
    secret: &str,
    issuer: &str,
    audience: &str,
) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
        jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::MissingClaim(claim.clone())
        }
        _ => TokenError::Malformed(e.to_string()),
    })?;

    Ok(token_data.claims)
}
