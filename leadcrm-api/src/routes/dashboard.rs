//! Dashboard summary
//!
//! Everything is recomputed from the lead table per request; there is no
//! caching layer at this scale.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use leadcrm_shared::{
    auth::middleware::AuthContext,
    dashboard::{bucket_by_month, month_start, trailing_month_starts},
    models::lead::Lead,
};
use serde_json::json;

const RECENT_LEADS: i64 = 5;
const TOP_SOURCES: i64 = 5;

/// `GET /api/dashboard/summary`
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let now = Utc::now();
    let this_month = month_start(now);
    let month_starts = trailing_month_starts(now);
    let window_start = month_starts[0];

    let total_leads = Lead::count_for_user(&state.db, auth.user_id).await?;
    let leads_this_month = Lead::count_since(&state.db, auth.user_id, this_month).await?;
    let recent_leads = Lead::recent_for_user(&state.db, auth.user_id, RECENT_LEADS).await?;
    let leads_by_source = Lead::top_sources(&state.db, auth.user_id, TOP_SOURCES).await?;

    let timestamps = Lead::created_at_since(&state.db, auth.user_id, window_start).await?;
    let series = bucket_by_month(&month_starts, &timestamps);

    let labels: Vec<&str> = series.iter().map(|p| p.month.as_str()).collect();
    let data: Vec<i64> = series.iter().map(|p| p.count).collect();

    Ok(Json(json!({
        "stats": {
            "totalLeads": total_leads,
            "leadsThisMonth": leads_this_month,
        },
        "recentLeads": recent_leads,
        "leadsBySource": leads_by_source,
        "leadsByMonth": {
            "labels": labels,
            "data": data,
        },
    })))
}
