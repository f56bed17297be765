//! Health check endpoint

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde_json::json;

/// `GET /health`
///
/// Reports service liveness and database reachability. Returns 200 even
/// when the database is down so load balancers can distinguish "process
/// up, dependency down" from "process gone".
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let database = match leadcrm_shared::db::pool::health_check(&state.db).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            "unreachable"
        }
    };

    Ok(Json(json!({
        "status": "ok",
        "version": leadcrm_shared::VERSION,
        "database": database,
    })))
}
