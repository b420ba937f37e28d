/// Application state and router builder
///
/// # Router Layout
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /v1/
///     ├── /auth/                    # Public auth endpoints
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /forgot-password
///     │   └── POST /reset-password
///     ├── GET /me                   # Any authenticated user
///     └── GET /users                # TEACHER only
/// ```
///
/// Protected routes sit behind the JWT middleware layer; the TEACHER gate
/// runs inline at the top of the guarded handler, after authentication.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use gradebook_shared::{
    auth::{
        middleware::{bearer_token, AuthContext, AuthError},
        token::validate_token,
    },
    email::Mailer,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned per request via axum's `State` extractor; the mailer collaborator
/// is injected here rather than reached through any global.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail collaborator
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Authentication configuration (secret, issuer, audience, expiries)
    pub fn auth_config(&self) -> &crate::config::AuthConfig {
        &self.config.auth
    }
}

/// Builds the complete router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no token required
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // Protected: JWT middleware short-circuits before any handler runs
    let protected_routes = Router::new()
        .route("/me", get(routes::account::me))
        .route("/users", get(routes::account::list_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::security::security_headers,
        ))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts the bearer token, validates signature/expiry/issuer/audience,
/// and injects an [`AuthContext`] into the request extensions. On any
/// failure the guarded handler never executes.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&req)?.to_string();

    let auth = state.auth_config();
    let claims = validate_token(&token, &auth.jwt_secret, &auth.issuer, &auth.audience)
        .map_err(AuthError::InvalidToken)?;

    let auth_context = AuthContext::from_claims(&claims).map_err(AuthError::InvalidToken)?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
