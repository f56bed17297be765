//! Lead model
//!
//! A lead is a potential customer owned by exactly one user. Every query
//! here is scoped by `user_id`, so one user's leads are invisible to
//! another; a cross-user lookup behaves like a missing row.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE leads (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     name VARCHAR(255) NOT NULL,
//!     contact VARCHAR(255),
//!     source VARCHAR(255),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_leads_user_created ON leads(user_id, created_at DESC);
//! ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A sales lead
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A lead source and how many leads carry it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

impl Lead {
    /// Creates a single lead
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        name: &str,
        contact: Option<&str>,
        source: Option<&str>,
    ) -> Result<Lead, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (user_id, name, contact, source)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, contact, source, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(contact)
        .bind(source)
        .fetch_one(pool)
        .await
    }

    /// Inserts many leads in one statement via UNNEST
    ///
    /// The three slices must be the same length; rows are inserted in slice
    /// order and returned in that same order.
    pub async fn bulk_create(
        pool: &PgPool,
        user_id: Uuid,
        names: &[String],
        contacts: &[Option<String>],
        sources: &[Option<String>],
    ) -> Result<Vec<Lead>, sqlx::Error> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (user_id, name, contact, source)
            SELECT $1, t.name, t.contact, t.source
            FROM UNNEST($2::varchar[], $3::varchar[], $4::varchar[])
                WITH ORDINALITY AS t(name, contact, source, ord)
            ORDER BY t.ord
            RETURNING id, user_id, name, contact, source, created_at
            "#,
        )
        .bind(user_id)
        .bind(names)
        .bind(contacts)
        .bind(sources)
        .fetch_all(pool)
        .await
    }

    /// Lists a user's leads, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, user_id, name, contact, source, created_at
            FROM leads
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Finds one of the user's leads by ID
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, user_id, name, contact, source, created_at
            FROM leads
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates one of the user's leads, returning the new row if it existed
    pub async fn update_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        name: &str,
        contact: Option<&str>,
        source: Option<&str>,
    ) -> Result<Option<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET name = $3, contact = $4, source = $5
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, contact, source, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(contact)
        .bind(source)
        .fetch_optional(pool)
        .await
    }

    /// Deletes one of the user's leads, returning the removed row if it existed
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            DELETE FROM leads
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, contact, source, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Total leads a user owns
    pub async fn count_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Leads a user created at or after `since`
    pub async fn count_since(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leads WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// The user's most recent leads
    pub async fn recent_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Lead>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, user_id, name, contact, source, created_at
            FROM leads
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

    /// The user's most common sources, missing source shown as "No source"
    pub async fn top_sources(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<SourceCount>, sqlx::Error> {
        sqlx::query_as::<_, SourceCount>(
            r#"
            SELECT COALESCE(source, 'No source') AS source, COUNT(*) AS count
            FROM leads
            WHERE user_id = $1
            GROUP BY COALESCE(source, 'No source')
            ORDER BY count DESC, source ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Creation timestamps of every lead the user created at or after `since`
    ///
    /// Used by the dashboard to bucket leads into calendar months in Rust
    /// rather than in SQL.
    pub async fn created_at_since(
        pool: &PgPool,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT created_at FROM leads WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }

    /// Normalized keys of the user's existing leads, for import deduplication
    pub async fn normalized_keys(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<(String, Option<String>, Option<String>)>, sqlx::Error> {
        sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
            "SELECT name, contact, source FROM leads WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
