//! Common test utilities for integration tests
//!
//! Shared infrastructure for tests that need a real database:
//! - Test database setup and migrations
//! - Test user creation with a valid JWT
//! - Request/response helpers

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use leadcrm_api::app::{build_router, AppState};
use leadcrm_api::config::{
    ApiConfig, Config, DatabaseConfig, JwtConfig, PasswordResetConfig, RateLimitConfig,
};
use leadcrm_shared::auth::jwt::{create_token, Claims};
use leadcrm_shared::auth::password::hash_password;
use leadcrm_shared::email::{Mailer, NullMailer};
use leadcrm_shared::models::user::User;
use leadcrm_shared::ratelimit::MemoryRateLimitStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub user: User,
    pub jwt_token: String,
}

/// Configuration for tests: in-process limiter with a high ceiling so
/// rate limiting never interferes with unrelated assertions
fn test_config(database_url: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiry_hours: 1,
        },
        rate_limit: RateLimitConfig {
            max_requests: 10_000,
            window_seconds: 60,
            redis_url: None,
        },
        password_reset: PasswordResetConfig {
            frontend_url: "http://localhost:5173".to_string(),
            token_ttl_minutes: 30,
            return_dev_token: true,
        },
        smtp: None,
    }
}

impl TestContext {
    /// Creates a new test context with a fresh user
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_mailer(Arc::new(NullMailer)).await
    }

    /// Creates a test context routing email through the given mailer
    pub async fn with_mailer(mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/leadcrm_test".to_string());

        let db = PgPool::connect(&database_url).await?;

        // Path relative to Cargo.toml, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = test_config(database_url);

        let password_hash = hash_password(TEST_PASSWORD)?;
        let user = User::create(
            &db,
            &format!("test-{}@example.com", Uuid::new_v4()),
            &password_hash,
            "Test User",
        )
        .await?;

        let claims = Claims::new(user.id, &user.email, chrono::Duration::hours(1));
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        let state = AppState::with_parts(
            db.clone(),
            config,
            Arc::new(MemoryRateLimitStore::new()),
            mailer,
        );
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            user,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Creates a second, independent user with their own token
    pub async fn other_user(&self) -> anyhow::Result<(User, String)> {
        let password_hash = hash_password(TEST_PASSWORD)?;
        let user = User::create(
            &self.db,
            &format!("other-{}@example.com", Uuid::new_v4()),
            &password_hash,
            "Other User",
        )
        .await?;

        let claims = Claims::new(user.id, &user.email, chrono::Duration::hours(1));
        let token = create_token(&claims, TEST_JWT_SECRET)?;

        Ok((user, token))
    }

    /// Sends an authenticated JSON request
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        self.request_with_token(method, uri, body, Some(&self.jwt_token))
            .await
    }

    /// Sends a JSON request with an explicit (or no) token
    pub async fn request_with_token(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };

        self.app
            .clone()
            .call(builder.body(body).expect("Request should build"))
            .await
            .expect("Request should not error")
    }

    /// Cleans up test data (cascades to leads, tokens, and audit events)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Parses a JSON response body, panicking with the body text on failure
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Body should read");
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Invalid JSON body ({}): {}", e, String::from_utf8_lossy(&bytes)))
}

/// Asserts a status, printing the body when it mismatches
pub async fn expect_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let body = json_body(response).await;
    assert_eq!(status, expected, "Unexpected status, body: {}", body);
    body
}
