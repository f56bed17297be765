//! Password reset tokens
//!
//! Only the SHA-256 hash of a token is stored; the plaintext token exists
//! once, in the email (or the dev-mode response). Tokens expire after a
//! configurable window and are single-use: consuming a token sets
//! `used_at`, and consumption happens in the same transaction as the
//! password update so a token can never succeed twice.
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE password_reset_tokens (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     token_hash VARCHAR(64) UNIQUE NOT NULL,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     used_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// A stored (hashed) reset token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Generates a 32-byte random token, hex-encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of the plaintext token, hex-encoded
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl PasswordResetToken {
    /// Stores the hash of a freshly issued token
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<PasswordResetToken, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(Utc::now() + ttl)
        .fetch_one(pool)
        .await
    }

    /// Finds an unused, unexpired token by its hash
    pub async fn find_active(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Consumes a token and updates the user's password atomically
    ///
    /// Returns `true` when the token was still active at commit time. The
    /// `used_at IS NULL` guard inside the transaction is what makes two
    /// concurrent resets with the same token resolve to one winner.
    pub async fn consume_and_update_password(
        pool: &PgPool,
        token_id: Uuid,
        user_id: Uuid,
        new_password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let consumed = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(token_id)
        .execute(&mut *tx)
        .await?;

        if consumed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(new_password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_is_random() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_deterministic_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash, hash_token("abc"));
    }

    #[test]
    fn test_hash_differs_from_token() {
        let token = generate_token();
        assert_ne!(hash_token(&token), token);
    }
}
