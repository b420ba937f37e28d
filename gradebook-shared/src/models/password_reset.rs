/// Password reset ticket model
///
/// A ticket is single-use and time-bounded. The raw token travels to the
/// user by email and is never stored; the database keeps only its SHA-256,
/// so a leaked table cannot be replayed. A ticket is actionable while
/// `used_at` is NULL and `expires_at` is in the future, and creating a new
/// ticket retires any still-unused ones so at most one stays actionable per
/// user. Historical rows are kept.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_reset_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash TEXT NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     used_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::User;

/// Raw token length in bytes (before URL-safe base64 encoding)
pub const RESET_TOKEN_BYTES: usize = 32;

/// Reset ticket row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PasswordResetToken {
    /// Ticket id
    pub id: Uuid,

    /// Owning user
    pub user_id: i64,

    /// SHA-256 hex of the raw token
    #[serde(skip)]
    pub token_hash: String,

    /// Instant after which the ticket is dead
    pub expires_at: DateTime<Utc>,

    /// Set on first successful use; NULL while actionable
    pub used_at: Option<DateTime<Utc>>,

    /// When the ticket was created
    pub created_at: DateTime<Utc>,
}

/// Generates a raw reset token
///
/// 32 bytes from the OS CSPRNG, URL-safe base64 without padding, so the
/// token can sit in a reset link query parameter untouched.
pub fn generate_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hashes a raw token for storage and lookup
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl PasswordResetToken {
    /// Checks whether the ticket's expiry instant has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Creates a ticket for a user and returns it with the raw token
    ///
    /// The raw token is returned exactly once, for the email dispatch, and
    /// is not recoverable afterwards. Any still-unused tickets for the same
    /// user are retired in the same transaction, keeping a single
    /// actionable ticket per user.
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        ttl: Duration,
    ) -> Result<(Self, String), sqlx::Error> {
        let raw = generate_token();
        let token_hash = hash_token(&raw);
        let expires_at = Utc::now() + ttl;

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE user_id = $1 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let ticket = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((ticket, raw))
    }

    /// Consumes a ticket and updates the user's credentials atomically
    ///
    /// Looks up an unused, unexpired ticket by the raw token's hash with a
    /// row lock, replaces the user's hash and salt, and marks the ticket
    /// used — all in one transaction. There is no reachable state where the
    /// ticket is spent but the password unchanged, or the reverse.
    ///
    /// # Returns
    ///
    /// `Ok(Some(user_id))` on success; `Ok(None)` if no actionable ticket
    /// matches (unknown, already used, or expired — indistinguishable to
    /// the caller by design).
    pub async fn consume(
        pool: &PgPool,
        raw_token: &str,
        new_password_hash: &str,
        new_salt: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        let token_hash = hash_token(raw_token);

        let mut tx = pool.begin().await?;

        let ticket = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            FOR UPDATE
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = ticket else {
            return Ok(None);
        };

        User::update_password(&mut tx, ticket.user_id, new_password_hash, new_salt).await?;

        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1")
            .bind(ticket.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(ticket.user_id))
    }
}
