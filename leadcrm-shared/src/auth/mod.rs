//! Authentication utilities
//!
//! - `jwt`: HS256 token creation and validation
//! - `password`: Argon2id password hashing and verification
//! - `middleware`: bearer-token extraction and the per-request auth context

pub mod jwt;
pub mod middleware;
pub mod password;
