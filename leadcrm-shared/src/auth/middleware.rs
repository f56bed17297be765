//! Authentication context and bearer-token extraction
//!
//! The API crate wires [`bearer_token`] and `jwt::validate_token` into an
//! Axum middleware layer that injects an [`AuthContext`] into request
//! extensions; handlers read it back with the `Extension` extractor.
//!
//! # Example
//!
//! ```
//! use axum::Extension;
//! use leadcrm_shared::auth::middleware::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("User: {}", auth.user_id)
//! }
//! ```
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authentication context added to request extensions after a token check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email from the token claims
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: &super::jwt::Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
        }
    }
}

/// Error type for the authentication gate
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing Authorization header
    #[error("Missing Bearer token")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        };
        (status, self.to_string()).into_response()
    }
}

/// Extracts the bearer token from request headers
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` when the Authorization header is
/// absent and `AuthError::InvalidFormat` when it is not a Bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;
    use axum::http::HeaderValue;

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@b.com", chrono::Duration::hours(1));

        let context = AuthContext::from_claims(&claims);
        assert_eq!(context.user_id, user_id);
        assert_eq!(context.email, "a@b.com");
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));

        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));
    }

    #[test]
    fn test_auth_error_status() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
