//! HTTP middleware
//!
//! - `rate_limit`: fixed-window request limiting over the injected store
//! - `security`: standard security response headers

pub mod rate_limit;
pub mod security;
