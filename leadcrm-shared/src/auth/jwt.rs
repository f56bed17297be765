//! JWT token generation and validation
//!
//! Access tokens are signed with HS256 (HMAC-SHA256) and identify the user
//! on every protected request. There is no refresh flow; clients re-login
//! when the token expires.
//!
//! # Security
//!
//! - **Algorithm**: HS256
//! - **Expiration**: 1 hour by default, configurable per deployment
//! - **Validation**: signature, expiration, and issuer checks
//! - **Secret**: at least 32 bytes, enforced at configuration load
//!
//! # Example
//!
//! ```
//! use leadcrm_shared::auth::jwt::{create_token, validate_token, Claims};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let claims = Claims::new(Uuid::new_v4(), "user@example.com", chrono::Duration::hours(1));
//! let token = create_token(&claims, "secret-key-that-is-long-enough....")?;
//!
//! let validated = validate_token(&token, "secret-key-that-is-long-enough....")?;
//! assert_eq!(validated.sub, claims.sub);
//! # Ok(())
//! # }
//! ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer embedded in and required of every token
const ISSUER: &str = "leadcrm";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was signed for a different issuer
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// JWT claims
///
/// Standard claims plus the user's email, which the frontend displays
/// without an extra lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// User email (custom claim)
    pub email: String,

    /// Issuer - always "leadcrm"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    pub fn new(user_id: Uuid, email: &str, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies the signature, expiration, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for issuer mismatches, and `JwtError::ValidationError` otherwise.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
