//! Password hashing using Argon2id
//!
//! Passwords are stored as PHC-format Argon2id hashes and never in
//! plaintext. Verification is constant-time.
//!
//! # Example
//!
//! ```
//! use leadcrm_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("super_secret_password_123")?;
//! assert!(verify_password("super_secret_password_123", &hash)?);
//! assert!(!verify_password("wrong_password", &hash)?);
//! # Ok(())
//! # }
//! ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2id and a random 16-byte salt
///
/// Returns a PHC string (algorithm, parameters, salt, and hash), e.g.
/// `$argon2id$v=19$m=19456,t=2,p=1$...$...`.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
/// A wrong password is `Ok(false)`, not an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("correct_password").expect("Hash should succeed");
        assert!(verify_password("correct_password", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("Hash should succeed");
        assert!(!verify_password("wrong_password", &hash).expect("Verify should succeed"));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let passwords = ["simple", "with spaces", "unicode-密码", "!@#$%^&*()"];

        for password in passwords {
            let hash = hash_password(password).expect("Hash should succeed");
            assert!(
                verify_password(password, &hash).expect("Verify should succeed"),
                "Password '{}' should verify",
                password
            );
        }
    }
}
