//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use leadcrm_api::{app::AppState, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let state = AppState::new(pool, config).await?;
//! let app = leadcrm_api::app::build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use leadcrm_shared::{
    auth::{jwt, middleware::AuthContext},
    email::{Mailer, NullMailer, SmtpMailer},
    ratelimit::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Injected rate-limit counter (in-process or Redis)
    pub rate_limiter: Arc<dyn RateLimitStore>,

    /// Outbound email delivery
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates application state, wiring the rate-limit store and mailer
    /// from config
    ///
    /// # Errors
    ///
    /// Returns an error if the configured Redis or SMTP endpoints cannot
    /// be set up.
    pub async fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let rate_limiter: Arc<dyn RateLimitStore> = match &config.rate_limit.redis_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                let connection = client.get_connection_manager().await?;
                info!("Rate limiter using shared Redis counter");
                Arc::new(RedisRateLimitStore::new(connection))
            }
            None => {
                info!("Rate limiter using in-process counter");
                Arc::new(MemoryRateLimitStore::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, "Email delivery via SMTP");
                Arc::new(SmtpMailer::new(smtp)?)
            }
            None => {
                info!("Email delivery disabled, reset links will be logged");
                Arc::new(NullMailer)
            }
        };

        Ok(Self {
            db,
            config: Arc::new(config),
            rate_limiter,
            mailer,
        })
    }

    /// Builds state with explicit collaborators, used by tests
    pub fn with_parts(
        db: PgPool,
        config: Config,
        rate_limiter: Arc<dyn RateLimitStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            rate_limiter,
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── POST /register            # Public, rate limited
///     ├── POST /login
///     ├── POST /password/forgot
///     ├── POST /password/reset
///     ├── GET/PUT /me               # Authenticated from here down
///     ├── POST /password/change
///     ├── /leads                    # GET list, create/update/delete/import
///     ├── GET /audit
///     └── GET /dashboard/summary
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Rate limiting (all /api routes)
/// 5. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public API routes (no auth, rate limited per client IP)
    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/password/forgot", post(routes::password::forgot_password))
        .route("/password/reset", post(routes::password::reset_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ));

    // Everything below requires a valid bearer token. Auth is the outer
    // layer so the rate limiter can key by authenticated user.
    let protected_routes = Router::new()
        .route("/me", get(routes::profile::get_me))
        .route("/me", put(routes::profile::update_me))
        .route("/password/change", post(routes::password::change_password))
        .route("/leads", get(routes::leads::list_leads))
        .route("/leads/create", post(routes::leads::create_lead))
        .route("/leads/update", put(routes::leads::update_lead))
        .route("/leads/delete", delete(routes::leads::delete_lead))
        .route("/leads/import", post(routes::leads::import_leads))
        .route("/audit", get(routes::audit::list_audit_events))
        .route("/dashboard/summary", get(routes::dashboard::summary))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    // Configure CORS based on environment
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
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                crate::middleware::security::security_headers(req, next, production).await
            },
        ))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token, then injects AuthContext
/// into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let token = leadcrm_shared::auth::middleware::bearer_token(req.headers())?;
    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
