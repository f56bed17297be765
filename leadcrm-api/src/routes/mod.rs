//! HTTP route handlers
//!
//! Handlers validate the request, call model/pipeline code, record the
//! audit event, and shape the JSON response. No SQL lives here.

pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod leads;
pub mod password;
pub mod profile;
