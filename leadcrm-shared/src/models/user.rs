//! User account model
//!
//! Users authenticate with email and password and own all of their leads,
//! audit events, and reset tokens. Emails are stored as `citext`, so
//! uniqueness is case-insensitive at the database level.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email CITEXT UNIQUE NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     name VARCHAR(255) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A registered user
///
/// Deliberately not `Serialize`: the password hash must never reach the
/// wire. Handlers return [`UserView`] instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The safe-to-serialize projection of a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::Database` with the unique violation code when
    /// the email is already registered (mapped to 409 by the API layer).
    pub async fn create(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email::text, password_hash, name, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by email (case-insensitive via citext)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email::text, password_hash, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email::text, password_hash, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Updates the display name
    pub async fn update_name(pool: &PgPool, id: Uuid, name: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email::text, password_hash, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Replaces the stored password hash
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_view_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            name: "Ada".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = UserView::from(&user);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["name"], "Ada");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_user_view_camel_case_keys() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            password_hash: String::new(),
            name: "Ada".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(json.get("createdAt").is_some());
    }
}
