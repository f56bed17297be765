//! Error handling for the API server
//!
//! This module provides a unified error type that maps to HTTP responses.
//! All handlers return `Result<T, ApiError>` which converts to the
//! appropriate status code and a JSON error body.
//!
//! # Example
//!
//! ```
//! use leadcrm_api::error::{ApiError, ApiResult};
//! use axum::Json;
//! use serde_json::json;
//!
//! async fn handler() -> ApiResult<Json<serde_json::Value>> {
//!     Ok(Json(json!({ "ok": true })))
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Validation failure (400) with field-level detail
    ValidationError(Vec<ValidationErrorDetail>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Too many requests (429)
    RateLimitExceeded { retry_after: u64, message: String },

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation, e.g. `leads[3].name`
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::RateLimitExceeded { message, .. } => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Handle rate limit separately to add Retry-After header
        if let ApiError::RateLimitExceeded { retry_after, message } = &self {
            let body = Json(ErrorResponse {
                error: "rate_limit_exceeded".to_string(),
                message: message.clone(),
                details: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
            return response;
        }

        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::RateLimitExceeded { message, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                message,
                None,
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Validates a request body, collecting field-level failures
///
/// # Errors
///
/// Returns `ApiError::ValidationError` (400) listing every failed field.
pub fn validate<T: validator::Validate>(body: &T) -> Result<(), ApiError> {
    body.validate().map_err(|errors| {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    })
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violations
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<leadcrm_shared::auth::middleware::AuthError> for ApiError {
    fn from(err: leadcrm_shared::auth::middleware::AuthError) -> Self {
        use leadcrm_shared::auth::middleware::AuthError;

        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat => ApiError::BadRequest("Expected Bearer token".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert JWT errors to API errors
impl From<leadcrm_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: leadcrm_shared::auth::jwt::JwtError) -> Self {
        use leadcrm_shared::auth::jwt::JwtError;

        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<leadcrm_shared::auth::password::PasswordError> for ApiError {
    fn from(err: leadcrm_shared::auth::password::PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert import validation errors to API errors
impl From<Vec<leadcrm_shared::import::ImportError>> for ApiError {
    fn from(errors: Vec<leadcrm_shared::import::ImportError>) -> Self {
        use leadcrm_shared::import::ImportError;

        let details = errors
            .into_iter()
            .map(|e| match &e {
                ImportError::BatchSize(_) => ValidationErrorDetail {
                    field: "leads".to_string(),
                    message: e.to_string(),
                },
                ImportError::MissingName(i) => ValidationErrorDetail {
                    field: format!("leads[{}].name", i),
                    message: "name is required".to_string(),
                },
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

/// Convert rate-limit store errors to API errors
impl From<leadcrm_shared::ratelimit::RateLimitError> for ApiError {
    fn from(err: leadcrm_shared::ratelimit::RateLimitError) -> Self {
        ApiError::InternalError(format!("Rate limit store error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadcrm_shared::import::ImportError;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Lead not found".to_string());
        assert_eq!(err.to_string(), "Not found: Lead not found");
    }

    #[test]
    fn test_validation_error_is_400() {
        let err = ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "email".to_string(),
            message: "Invalid email format".to_string(),
        }]);

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let err = ApiError::RateLimitExceeded {
            retry_after: 30,
            message: "Too many requests".to_string(),
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "30");
    }

    #[test]
    fn test_import_errors_map_to_field_details() {
        let err: ApiError = vec![ImportError::MissingName(3)].into();

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "leads[3].name");
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
