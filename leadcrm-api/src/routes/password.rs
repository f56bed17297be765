//! Password reset and change
//!
//! The forgot endpoint always answers 200 whether or not the email exists,
//! so the API cannot be used to enumerate accounts. The reset endpoint
//! gives one generic 400 for invalid, expired, and already-used tokens
//! alike.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use leadcrm_shared::{
    auth::password,
    models::{
        audit_event::{AuditAction, AuditEvent},
        password_reset::{self, PasswordResetToken},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub ok: bool,

    /// Raw token, echoed only outside production for local testing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// `POST /api/password/forgot`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ForgotPasswordResponse>> {
    validate(&body)?;

    let user = match User::find_by_email(&state.db, body.email.trim()).await? {
        Some(user) => user,
        // Same response as the success path
        None => {
            return Ok(Json(ForgotPasswordResponse {
                ok: true,
                dev_token: None,
            }))
        }
    };

    let token = password_reset::generate_token();
    let token_hash = password_reset::hash_token(&token);
    let ttl = chrono::Duration::minutes(state.config.password_reset.token_ttl_minutes);

    PasswordResetToken::create(&state.db, user.id, &token_hash, ttl).await?;

    AuditEvent::record(
        &state.db,
        user.id,
        AuditAction::PasswordResetRequest,
        Some(user.id),
        None,
        None,
        None,
    )
    .await?;

    let reset_url = format!(
        "{}/reset-password?token={}",
        state.config.password_reset.frontend_url.trim_end_matches('/'),
        token
    );

    // A delivery failure must not change the response: an error here would
    // let callers probe which emails have accounts.
    if let Err(e) = state
        .mailer
        .send_password_reset(&user.email, &user.name, &reset_url)
        .await
    {
        tracing::error!(user_id = %user.id, "Failed to send password reset email: {}", e);
    }

    info!(user_id = %user.id, "Password reset requested");

    let dev_token = state
        .config
        .password_reset
        .return_dev_token
        .then_some(token);

    Ok(Json(ForgotPasswordResponse {
        ok: true,
        dev_token,
    }))
}

/// `POST /api/password/reset`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate(&body)?;

    let generic = || ApiError::BadRequest("Invalid or expired reset token".to_string());

    let token_hash = password_reset::hash_token(body.token.trim());
    let record = PasswordResetToken::find_active(&state.db, &token_hash)
        .await?
        .ok_or_else(generic)?;

    let new_hash = password::hash_password(&body.new_password)?;

    // Re-checked inside the transaction; a concurrent reset with the same
    // token loses here.
    let consumed = PasswordResetToken::consume_and_update_password(
        &state.db,
        record.id,
        record.user_id,
        &new_hash,
    )
    .await?;

    if !consumed {
        return Err(generic());
    }

    AuditEvent::record(
        &state.db,
        record.user_id,
        AuditAction::PasswordReset,
        Some(record.user_id),
        None,
        None,
        None,
    )
    .await?;

    info!(user_id = %record.user_id, "Password reset completed");

    Ok(Json(json!({ "ok": true })))
}

/// `POST /api/password/change` (authenticated)
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<leadcrm_shared::auth::middleware::AuthContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate(&body)?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&body.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let new_hash = password::hash_password(&body.new_password)?;
    User::update_password_hash(&state.db, user.id, &new_hash).await?;

    AuditEvent::record(
        &state.db,
        user.id,
        AuditAction::PasswordChange,
        Some(user.id),
        None,
        None,
        None,
    )
    .await?;

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_request_validation() {
        let bad = ResetPasswordRequest {
            token: "abc".to_string(),
            new_password: "short".to_string(),
        };
        assert!(validate(&bad).is_err());
    }

    #[test]
    fn test_dev_token_omitted_when_none() {
        let response = ForgotPasswordResponse {
            ok: true,
            dev_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("devToken").is_none());
    }

    #[test]
    fn test_dev_token_uses_camel_case() {
        let response = ForgotPasswordResponse {
            ok: true,
            dev_token: Some("raw".to_string()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["devToken"], "raw");
    }
}
