//! Database models
//!
//! Each model owns its table: the struct mirrors the row, and static
//! methods wrap the SQL. Handlers never write queries directly.

pub mod audit_event;
pub mod lead;
pub mod password_reset;
pub mod user;

pub use audit_event::{AuditAction, AuditEvent};
pub use lead::Lead;
pub use password_reset::PasswordResetToken;
pub use user::User;
