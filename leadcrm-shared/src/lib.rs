//! # LeadCRM Shared Library
//!
//! This crate contains the types and business logic shared by the LeadCRM
//! API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: JWT and password-hashing utilities
//! - `db`: Connection pool and migrations
//! - `import`: Lead import normalization and deduplication pipeline
//! - `dashboard`: Calendar-month bucketing helpers for the summary endpoint
//! - `ratelimit`: Fixed-window rate-limit stores
//! - `email`: SMTP mailer used by the password-reset flow

pub mod auth;
pub mod dashboard;
pub mod db;
pub mod email;
pub mod import;
pub mod models;
pub mod ratelimit;

/// Current version of the LeadCRM shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
