/// Authenticated account endpoints
///
/// # Endpoints
///
/// - `GET /v1/me` - Identity of the calling token (any authenticated user)
/// - `GET /v1/users` - Account listing (TEACHER only)
///
/// Both routes sit behind the JWT middleware; `/v1/users` additionally runs
/// the role gate before touching the database.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use gradebook_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::user::{Role, User},
};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::ApiResult};

/// Current-identity response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: AuthContext,
}

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Account listing entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
}

/// Account listing response
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserEntry>,
}

/// Returns the identity carried by the presented token
///
/// Purely a readback of the validated claims; no database access.
pub async fn me(Extension(auth): Extension<AuthContext>) -> ApiResult<Json<MeResponse>> {
    Ok(Json(MeResponse {
        success: true,
        user: auth,
    }))
}

/// Lists accounts, newest first
///
/// Teacher-only: the role gate runs before the query, so a student token
/// gets a 403 without any data being read.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<UsersResponse>> {
    require_role(&auth, Role::Teacher)?;

    let limit = pagination.limit.clamp(1, 200);
    let offset = pagination.offset.max(0);

    let users = User::list(&state.db, limit, offset).await?;

    Ok(Json(UsersResponse {
        success: true,
        users: users
            .into_iter()
            .map(|u| UserEntry {
                id: u.id,
                email: u.email,
                username: u.username,
                role: u.role,
            })
            .collect(),
    }))
}
