/// Profile model
///
/// Name data owned by the user row; created only inside the registration
/// transaction and deleted by cascade with the account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// Profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Owning user id (also the primary key)
    pub user_id: i64,

    /// First name, non-empty, no whitespace
    pub first_name: String,

    /// Last name, non-empty, no whitespace
    pub last_name: String,

    /// When the profile was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a profile
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub first_name: String,
    pub last_name: String,
}

impl Profile {
    /// Inserts a profile for a user
    ///
    /// Takes a connection so registration can run it inside the same
    /// transaction as the user insert; see
    /// [`User::create_with_profile`](super::user::User::create_with_profile).
    pub async fn create(
        conn: &mut PgConnection,
        user_id: i64,
        data: CreateProfile,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING user_id, first_name, last_name, created_at
            "#,
        )
        .bind(user_id)
        .bind(data.first_name)
        .bind(data.last_name)
        .fetch_one(conn)
        .await
    }

    /// Finds the profile for a user
    pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, first_name, last_name, created_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
