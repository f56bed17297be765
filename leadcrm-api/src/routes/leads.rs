//! Lead CRUD and batch import
//!
//! All operations are scoped to the authenticated owner: a lead that
//! exists but belongs to someone else is indistinguishable from a missing
//! one (404). Every successful mutation appends exactly one audit event;
//! an import is one event for the whole batch, not one per row.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use leadcrm_shared::{
    auth::middleware::AuthContext,
    import::{self, ImportMode, RawLeadRow},
    models::{
        audit_event::{AuditAction, AuditEvent},
        lead::Lead,
    },
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLeadRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteLeadRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ImportLeadsRequest {
    pub leads: Vec<RawLeadRow>,

    #[serde(default)]
    pub mode: ImportMode,
}

/// Trims an optional field, mapping blank to null
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Lead not found".to_string())
}

/// `GET /api/leads`
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let leads = Lead::list_for_user(&state.db, auth.user_id).await?;
    Ok(Json(json!({ "leads": leads })))
}

/// `POST /api/leads/create`
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    validate(&body)?;

    let contact = clean(body.contact);
    let source = clean(body.source);

    let lead = Lead::create(
        &state.db,
        auth.user_id,
        body.name.trim(),
        contact.as_deref(),
        source.as_deref(),
    )
    .await?;

    AuditEvent::record(
        &state.db,
        auth.user_id,
        AuditAction::LeadCreate,
        Some(lead.id),
        None,
        Some(json!(&lead)),
        None,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "lead": lead }))))
}

/// `PUT /api/leads/update`
pub async fn update_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<UpdateLeadRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate(&body)?;

    let before = Lead::find_for_user(&state.db, auth.user_id, body.id)
        .await?
        .ok_or_else(not_found)?;

    let contact = clean(body.contact);
    let source = clean(body.source);

    let lead = Lead::update_for_user(
        &state.db,
        auth.user_id,
        body.id,
        body.name.trim(),
        contact.as_deref(),
        source.as_deref(),
    )
    .await?
    .ok_or_else(not_found)?;

    AuditEvent::record(
        &state.db,
        auth.user_id,
        AuditAction::LeadUpdate,
        Some(lead.id),
        Some(json!(&before)),
        Some(json!(&lead)),
        None,
    )
    .await?;

    Ok(Json(json!({ "lead": lead })))
}

/// `DELETE /api/leads/delete`
pub async fn delete_lead(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<DeleteLeadRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let removed = Lead::delete_for_user(&state.db, auth.user_id, body.id)
        .await?
        .ok_or_else(not_found)?;

    AuditEvent::record(
        &state.db,
        auth.user_id,
        AuditAction::LeadDelete,
        Some(removed.id),
        Some(json!(&removed)),
        None,
        None,
    )
    .await?;

    Ok(Json(json!({ "success": true })))
}

/// `POST /api/leads/import`
///
/// Validation is all-or-nothing: a single bad row rejects the whole batch
/// before anything is persisted. The duplicate check reads persisted keys
/// and then bulk-inserts without a wrapping transaction, so two racing
/// imports for the same user can both insert the same key.
pub async fn import_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<ImportLeadsRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let normalized = import::normalize_rows(&body.leads)?;

    let existing_keys: HashSet<String> = match body.mode {
        ImportMode::AlwaysCreate => HashSet::new(),
        ImportMode::SkipExactDuplicates => Lead::normalized_keys(&state.db, auth.user_id)
            .await?
            .into_iter()
            .map(|(name, contact, source)| {
                import::normalized_key(&name, contact.as_deref(), source.as_deref())
            })
            .collect(),
    };

    let plan = import::plan_import(normalized, existing_keys, body.mode);

    if !plan.to_create.is_empty() {
        let mut names = Vec::with_capacity(plan.to_create.len());
        let mut contacts = Vec::with_capacity(plan.to_create.len());
        let mut sources = Vec::with_capacity(plan.to_create.len());

        for lead in &plan.to_create {
            names.push(lead.name.clone());
            contacts.push(lead.contact.clone());
            sources.push(lead.source.clone());
        }

        Lead::bulk_create(&state.db, auth.user_id, &names, &contacts, &sources).await?;
    }

    AuditEvent::record(
        &state.db,
        auth.user_id,
        AuditAction::LeadImport,
        None,
        None,
        None,
        Some(json!({
            "received": plan.counts.received,
            "created": plan.counts.created,
            "skipped": plan.counts.skipped,
            "mode": body.mode.as_str(),
        })),
    )
    .await?;

    info!(
        user_id = %auth.user_id,
        received = plan.counts.received,
        created = plan.counts.created,
        skipped = plan.counts.skipped,
        "Lead import completed"
    );

    Ok(Json(json!(plan.counts)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_blank_optionals() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(None), None);
        assert_eq!(clean(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_import_request_omitted_mode_always_creates() {
        let body: ImportLeadsRequest = serde_json::from_str(
            r#"{"leads": [{"name": "Bob", "contact": "111"}, {"name": "Bob", "contact": "111"}]}"#,
        )
        .unwrap();
        assert_eq!(body.mode, ImportMode::AlwaysCreate);

        let normalized = leadcrm_shared::import::normalize_rows(&body.leads).unwrap();
        let plan =
            leadcrm_shared::import::plan_import(normalized, HashSet::new(), body.mode);
        assert_eq!(plan.counts.created, 2);
        assert_eq!(plan.counts.skipped, 0);
    }

    #[test]
    fn test_import_request_explicit_mode() {
        let body: ImportLeadsRequest =
            serde_json::from_str(r#"{"leads": [], "mode": "skip_exact_duplicates"}"#).unwrap();
        assert_eq!(body.mode, ImportMode::SkipExactDuplicates);
    }

    #[test]
    fn test_create_request_validation() {
        let bad = CreateLeadRequest {
            name: String::new(),
            contact: None,
            source: None,
        };
        assert!(validate(&bad).is_err());
    }
}
