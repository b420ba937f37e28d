/// User model and database operations
///
/// A user row owns the credential material (PBKDF2 hash + salt, both base64
/// text) and the account role. Emails are stored lowercase; uniqueness of
/// email and username is enforced by unique indexes, which are the real
/// safety net behind the check-then-insert in registration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email TEXT NOT NULL,
///     username TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     salt TEXT NOT NULL,
///     role TEXT NOT NULL CHECK (role IN ('TEACHER', 'STUDENT')),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX users_email_key ON users (email);
/// CREATE UNIQUE INDEX users_username_key ON users (username);
/// ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use super::profile::{CreateProfile, Profile};

/// Account role
///
/// A closed set, parsed once at the request boundary (case-insensitively)
/// and an enum everywhere after that. The wire and database encoding is the
/// uppercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    /// Parses a role from user input, case-insensitively
    ///
    /// Returns `None` for anything outside the closed set; callers surface
    /// that as an "Invalid role." validation failure.
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_ascii_uppercase().as_str() {
            "TEACHER" => Some(Role::Teacher),
            "STUDENT" => Some(Role::Student),
            _ => None,
        }
    }

    /// Uppercase wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account row
///
/// Credential fields never serialize into responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: i64,

    /// Email address, stored lowercase, unique
    pub email: String,

    /// Username, unique
    pub username: String,

    /// PBKDF2-SHA256 derived key, base64
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Per-credential random salt, base64
    #[serde(skip_serializing)]
    pub salt: String,

    /// Account role
    pub role: Role,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (caller lowercases before handing it in)
    pub email: String,

    /// Username
    pub username: String,

    /// Derived password hash (never the plaintext password)
    pub password_hash: String,

    /// Salt that produced the hash, base64
    pub salt: String,

    /// Account role
    pub role: Role,
}

impl User {
    /// Creates a user and their profile in a single transaction
    ///
    /// Both inserts commit together or neither does; a failure on the
    /// profile insert rolls the user insert back, so no half-registered
    /// account can persist. A concurrent duplicate slips past the
    /// check-then-insert in the handler and fails here on the unique index
    /// instead; the caller maps that to the same "already registered /
    /// already taken" outcome.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use gradebook_shared::models::user::{CreateUser, Role, User};
    /// # use gradebook_shared::models::profile::CreateProfile;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let (user, profile) = User::create_with_profile(
    ///     &pool,
    ///     CreateUser {
    ///         email: "alice@example.com".to_string(),
    ///         username: "alice".to_string(),
    ///         password_hash: "base64hash".to_string(),
    ///         salt: "base64salt".to_string(),
    ///         role: Role::Student,
    ///     },
    ///     CreateProfile {
    ///         first_name: "Alice".to_string(),
    ///         last_name: "Doe".to_string(),
    ///     },
    /// )
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_with_profile(
        pool: &PgPool,
        data: CreateUser,
        profile: CreateProfile,
    ) -> Result<(Self, Profile), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, salt, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, salt, role,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.salt)
        .bind(data.role)
        .fetch_one(&mut *tx)
        .await?;

        let profile = Profile::create(&mut tx, user.id, profile).await?;

        tx.commit().await?;

        Ok((user, profile))
    }

    /// Finds a user by email
    ///
    /// Callers lowercase the email first; lookup is exact after that, which
    /// keeps registration and login on the same normalization.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, salt, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, salt, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, salt, role,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Stamps the last-login timestamp after a successful authentication
    pub async fn update_last_login(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the credential material for a user
    ///
    /// Takes a connection rather than the pool so the reset flow can run it
    /// inside the same transaction that consumes the reset ticket.
    pub async fn update_password(
        conn: &mut PgConnection,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, salt = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(salt)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, salt, role,
                   created_at, updated_at, last_login_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
