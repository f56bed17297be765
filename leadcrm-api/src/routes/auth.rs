//! Registration and login
//!
//! Both endpoints return the same `{token, user}` shape so the client can
//! treat registration as an immediate login. Login failures are generic:
//! the response never says whether the email or the password was wrong.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use leadcrm_shared::{
    auth::{jwt, password},
    models::user::{User, UserView},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = jwt::Claims::new(
        user.id,
        &user.email,
        chrono::Duration::hours(state.config.jwt.expiry_hours),
    );
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// `POST /api/register`
///
/// Duplicate email maps to 409 via the unique constraint.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate(&body)?;

    let email = body.email.trim().to_lowercase();
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&email)
        .to_string();

    let password_hash = password::hash_password(&body.password)?;
    let user = User::create(&state.db, &email, &password_hash, &name).await?;

    info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView::from(&user),
        }),
    ))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    validate(&body)?;

    let generic = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, body.email.trim())
        .await?
        .ok_or_else(generic)?;

    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(generic());
    }

    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: None,
        };
        assert!(validate(&bad).is_err());

        let good = RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "long-enough-password".to_string(),
            name: Some("Ada".to_string()),
        };
        assert!(validate(&good).is_ok());
    }

    #[test]
    fn test_login_request_requires_password() {
        let bad = LoginRequest {
            email: "ada@example.com".to_string(),
            password: String::new(),
        };
        assert!(validate(&bad).is_err());
    }
}
