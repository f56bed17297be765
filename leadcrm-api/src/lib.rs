//! LeadCRM API server
//!
//! Axum HTTP server exposing the CRM: registration and login, lead CRUD
//! with batch import/deduplication, an append-only audit trail, a
//! dashboard summary, and the password-reset flow. Domain logic and
//! models live in `leadcrm-shared`; this crate owns configuration, the
//! router, error mapping, and middleware.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
