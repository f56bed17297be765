//! Audit trail listing

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use leadcrm_shared::{auth::middleware::AuthContext, models::audit_event::AuditEvent};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_TAKE: i64 = 50;
const MAX_TAKE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub take: Option<i64>,
}

/// Clamps the requested page size to 1..=200, defaulting to 50
fn clamp_take(take: Option<i64>) -> i64 {
    take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE)
}

/// `GET /api/audit?take=N`
pub async fn list_audit_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let events = AuditEvent::list_for_user(&state.db, auth.user_id, clamp_take(query.take)).await?;
    Ok(Json(json!({ "events": events })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_defaults_to_50() {
        assert_eq!(clamp_take(None), 50);
    }

    #[test]
    fn test_take_clamped_to_bounds() {
        assert_eq!(clamp_take(Some(0)), 1);
        assert_eq!(clamp_take(Some(-5)), 1);
        assert_eq!(clamp_take(Some(500)), 200);
        assert_eq!(clamp_take(Some(120)), 120);
    }
}
