//! Configuration management for the API server
//!
//! This module loads configuration from environment variables and provides
//! a type-safe configuration struct.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `PRODUCTION`: `true` enables strict CORS, HSTS, and disables dev tokens
//! - `CORS_ORIGINS`: comma-separated allowed origins, or `*`
//! - `JWT_SECRET`: Secret key for JWT signing (required, >= 32 chars)
//! - `JWT_EXPIRY_HOURS`: access token lifetime (default: 1)
//! - `RATE_LIMIT_MAX`: requests allowed per window (default: 100)
//! - `RATE_LIMIT_WINDOW_SECONDS`: window length (default: 60)
//! - `REDIS_URL`: optional; switches the rate limiter to Redis when set
//! - `FRONTEND_URL`: base for password-reset links (default: http://localhost:5173)
//! - `RESET_TOKEN_TTL_MINUTES`: reset token lifetime (default: 30)
//! - `RETURN_DEV_RESET_TOKEN`: echo reset tokens in responses (never in production)
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `SMTP_FROM`:
//!   enable real email delivery when all are set
//! - `RUST_LOG`: Log level (default: info)
//!
//! # Example
//!
//! ```no_run
//! use leadcrm_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use leadcrm_shared::email::SmtpConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Rate limiter configuration
    pub rate_limit: RateLimitConfig,

    /// Password reset configuration
    pub password_reset: PasswordResetConfig,

    /// SMTP delivery, None means log-only delivery
    #[serde(skip)]
    pub smtp: Option<SmtpConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Production hardening toggle
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in hours
    pub expiry_hours: i64,
}

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window per key
    pub max_requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Optional Redis URL for a shared counter across replicas
    pub redis_url: Option<String>,
}

/// Password reset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfig {
    /// Base URL the reset link points at
    pub frontend_url: String,

    /// Token lifetime in minutes
    pub token_ttl_minutes: i64,

    /// Echo the raw token in the forgot-password response
    ///
    /// Convenience for local development; forced off in production.
    pub return_dev_token: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let production = env::var("PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let jwt_expiry_hours = env::var("JWT_EXPIRY_HOURS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<i64>()?;

        let rate_limit_max = env::var("RATE_LIMIT_MAX")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u32>()?;

        let rate_limit_window = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()?;

        let redis_url = env::var("REDIS_URL").ok();

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let token_ttl_minutes = env::var("RESET_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<i64>()?;

        // Never echo reset tokens from a production deployment
        let return_dev_token = !production
            && env::var("RETURN_DEV_RESET_TOKEN")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true);

        let smtp = Self::smtp_from_env()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiry_hours: jwt_expiry_hours,
            },
            rate_limit: RateLimitConfig {
                max_requests: rate_limit_max,
                window_seconds: rate_limit_window,
                redis_url,
            },
            password_reset: PasswordResetConfig {
                frontend_url,
                token_ttl_minutes,
                return_dev_token,
            },
            smtp,
        })
    }

    /// SMTP is optional: all five variables or nothing
    fn smtp_from_env() -> anyhow::Result<Option<SmtpConfig>> {
        let host = match env::var("SMTP_HOST") {
            Ok(host) => host,
            Err(_) => return Ok(None),
        };

        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()?;
        let username = env::var("SMTP_USERNAME")
            .map_err(|_| anyhow::anyhow!("SMTP_USERNAME is required when SMTP_HOST is set"))?;
        let password = env::var("SMTP_PASSWORD")
            .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD is required when SMTP_HOST is set"))?;
        let from = env::var("SMTP_FROM")
            .map_err(|_| anyhow::anyhow!("SMTP_FROM is required when SMTP_HOST is set"))?;

        Ok(Some(SmtpConfig {
            host,
            port,
            username,
            password,
            from,
        }))
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
