//! Current-user profile

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use leadcrm_shared::{
    auth::middleware::AuthContext,
    models::{
        audit_event::{AuditAction, AuditEvent},
        user::{User, UserView},
    },
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: String,
}

/// `GET /api/me`
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserView::from(&user) })))
}

/// `PUT /api/me`
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate(&body)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name must not be blank".to_string()));
    }

    let before = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let updated = User::update_name(&state.db, auth.user_id, name).await?;

    AuditEvent::record(
        &state.db,
        auth.user_id,
        AuditAction::UserUpdate,
        Some(auth.user_id),
        Some(json!({ "name": before.name })),
        Some(json!({ "name": updated.name })),
        None,
    )
    .await?;

    Ok(Json(json!({ "user": UserView::from(&updated) })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_validation() {
        let bad = UpdateProfileRequest {
            name: String::new(),
        };
        assert!(validate(&bad).is_err());

        let long = UpdateProfileRequest {
            name: "x".repeat(81),
        };
        assert!(validate(&long).is_err());

        let good = UpdateProfileRequest {
            name: "Ada Lovelace".to_string(),
        };
        assert!(validate(&good).is_ok());
    }
}
