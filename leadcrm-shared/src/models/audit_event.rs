//! Append-only audit trail
//!
//! Every state-changing operation records exactly one event. Events are
//! never updated or deleted; there is deliberately no UPDATE or DELETE
//! method on this model.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE audit_events (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     action VARCHAR(50) NOT NULL,
//!     entity_type VARCHAR(50) NOT NULL,
//!     entity_id UUID,
//!     before JSONB,
//!     after JSONB,
//!     metadata JSONB,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_audit_events_user_created ON audit_events(user_id, created_at DESC);
//! ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    LeadCreate,
    LeadUpdate,
    LeadDelete,
    LeadImport,
    UserUpdate,
    PasswordChange,
    PasswordResetRequest,
    PasswordReset,
}

impl AuditAction {
    /// Returns the string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LeadCreate => "LEAD_CREATE",
            AuditAction::LeadUpdate => "LEAD_UPDATE",
            AuditAction::LeadDelete => "LEAD_DELETE",
            AuditAction::LeadImport => "LEAD_IMPORT",
            AuditAction::UserUpdate => "USER_UPDATE",
            AuditAction::PasswordChange => "PASSWORD_CHANGE",
            AuditAction::PasswordResetRequest => "PASSWORD_RESET_REQUEST",
            AuditAction::PasswordReset => "PASSWORD_RESET",
        }
    }

    /// Parses the stored string back into an action
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LEAD_CREATE" => Some(AuditAction::LeadCreate),
            "LEAD_UPDATE" => Some(AuditAction::LeadUpdate),
            "LEAD_DELETE" => Some(AuditAction::LeadDelete),
            "LEAD_IMPORT" => Some(AuditAction::LeadImport),
            "USER_UPDATE" => Some(AuditAction::UserUpdate),
            "PASSWORD_CHANGE" => Some(AuditAction::PasswordChange),
            "PASSWORD_RESET_REQUEST" => Some(AuditAction::PasswordResetRequest),
            "PASSWORD_RESET" => Some(AuditAction::PasswordReset),
            _ => None,
        }
    }

    /// The entity type this action operates on
    pub fn entity_type(&self) -> &'static str {
        match self {
            AuditAction::LeadCreate
            | AuditAction::LeadUpdate
            | AuditAction::LeadDelete
            | AuditAction::LeadImport => "lead",
            AuditAction::UserUpdate
            | AuditAction::PasswordChange
            | AuditAction::PasswordResetRequest
            | AuditAction::PasswordReset => "user",
        }
    }
}

/// One recorded audit event
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Appends one event to the trail
    pub async fn record(
        pool: &PgPool,
        user_id: Uuid,
        action: AuditAction,
        entity_id: Option<Uuid>,
        before: Option<Value>,
        after: Option<Value>,
        metadata: Option<Value>,
    ) -> Result<AuditEvent, sqlx::Error> {
        sqlx::query_as::<_, AuditEvent>(
            r#"
            INSERT INTO audit_events (user_id, action, entity_type, entity_id, before, after, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, action, entity_type, entity_id, before, after, metadata, created_at
            "#,
        )
        .bind(user_id)
        .bind(action.as_str())
        .bind(action.entity_type())
        .bind(entity_id)
        .bind(before)
        .bind(after)
        .bind(metadata)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's most recent events, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AuditEvent>, sqlx::Error> {
        sqlx::query_as::<_, AuditEvent>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, before, after, metadata, created_at
            FROM audit_events
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Counts a user's events
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_events WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_string_round_trip() {
        let actions = [
            AuditAction::LeadCreate,
            AuditAction::LeadUpdate,
            AuditAction::LeadDelete,
            AuditAction::LeadImport,
            AuditAction::UserUpdate,
            AuditAction::PasswordChange,
            AuditAction::PasswordResetRequest,
            AuditAction::PasswordReset,
        ];

        for action in actions {
            assert_eq!(AuditAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_unknown_action_string() {
        assert_eq!(AuditAction::from_str("LEAD_EXPLODE"), None);
    }

    #[test]
    fn test_entity_types() {
        assert_eq!(AuditAction::LeadImport.entity_type(), "lead");
        assert_eq!(AuditAction::PasswordChange.entity_type(), "user");
    }
}
