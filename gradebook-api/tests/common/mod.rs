/// Common test utilities for integration tests
///
/// Provides a `TestContext` holding a migrated database pool and the built
/// router, plus request helpers. Tests talk to the app the way a client
/// would, through `tower::Service::call`, and use unique per-context email
/// and username suffixes so they can run concurrently against one database.

use axum::body::Body;
use axum::http::{Request, Response};
use gradebook_api::app::{build_router, AppState};
use gradebook_api::config::Config;
use gradebook_shared::email::LogMailer;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::env;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,

    /// Unique tag woven into every email/username this context creates
    pub tag: String,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        // Only DATABASE_URL has to come from the environment.
        if env::var("JWT_SECRET").is_err() {
            env::set_var("JWT_SECRET", "integration-test-secret-at-least-32-bytes");
        }

        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config.clone(), Arc::new(LogMailer));
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            tag: Uuid::new_v4().simple().to_string(),
        })
    }

    /// Unique email for this context
    pub fn email(&self, name: &str) -> String {
        format!("{}-{}@example.com", name, self.tag)
    }

    /// Unique username for this context
    pub fn username(&self, name: &str) -> String {
        format!("{}-{}", name, self.tag)
    }

    /// Registration body with this context's defaults
    pub fn register_body(&self, name: &str, password: &str, role: &str) -> Value {
        json!({
            "email": self.email(name),
            "username": self.username(name),
            "password": password,
            "role": role,
            "firstName": "Test",
            "lastName": "User",
        })
    }

    /// Sends a POST with a JSON body
    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a GET, optionally with a bearer token
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = builder.body(Body::empty()).unwrap();
        self.app.clone().call(request).await.unwrap()
    }

    /// Registers an account and returns its token
    pub async fn register(&self, name: &str, password: &str, role: &str) -> anyhow::Result<String> {
        let response = self
            .post_json("/v1/auth/register", self.register_body(name, password, role))
            .await;

        let body = read_json(response).await;
        anyhow::ensure!(
            body["success"] == json!(true),
            "registration failed: {}",
            body
        );

        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    /// Deletes every row this context created (cascades to profiles and
    /// reset tickets)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(format!("%-{}@example.com", self.tag))
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Reads a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
