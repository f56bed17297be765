//! Rate limiting middleware
//!
//! Counts requests in fixed windows against the store injected into
//! `AppState`, so the same middleware works with the in-process map or a
//! shared Redis counter. Requests are keyed by authenticated user when
//! the auth layer already ran, otherwise by client IP.
//!
//! Denials return 429 with a `Retry-After` header.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use leadcrm_shared::{auth::middleware::AuthContext, ratelimit::Decision};
use std::time::Duration;
use tracing::warn;

/// Middleware entry point, wired via `from_fn_with_state`
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&req);

    let decision = state
        .rate_limiter
        .check(
            &key,
            state.config.rate_limit.max_requests,
            Duration::from_secs(state.config.rate_limit.window_seconds),
        )
        .await?;

    match decision {
        Decision::Allow => Ok(next.run(req).await),
        Decision::Deny { retry_after_seconds } => {
            warn!(key = %key, "Rate limit exceeded");
            Err(ApiError::RateLimitExceeded {
                retry_after: retry_after_seconds,
                message: "Too many requests, slow down".to_string(),
            })
        }
    }
}

/// Picks the counter key for a request
///
/// Authenticated requests count per user; anonymous ones per client IP
/// taken from the first `X-Forwarded-For` hop. Requests with neither
/// share one global bucket rather than bypassing the limiter.
fn client_key(req: &Request) -> String {
    if let Some(auth) = req.extensions().get::<AuthContext>() {
        return format!("user:{}", auth.user_id);
    }

    match forwarded_ip(req.headers()) {
        Some(ip) => format!("ip:{}", ip),
        None => "anonymous".to_string(),
    }
}

fn forwarded_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_ip_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        assert_eq!(forwarded_ip(&headers), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_ip_missing() {
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_key_prefers_authenticated_user() {
        let user_id = uuid::Uuid::new_v4();
        let mut req = Request::new(axum::body::Body::empty());
        req.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7"),
        );
        req.extensions_mut().insert(AuthContext {
            user_id,
            email: "a@b.com".to_string(),
        });

        assert_eq!(client_key(&req), format!("user:{}", user_id));
    }

    #[test]
    fn test_key_falls_back_to_ip_then_global() {
        let mut req = Request::new(axum::body::Body::empty());
        assert_eq!(client_key(&req), "anonymous");

        req.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7"),
        );
        assert_eq!(client_key(&req), "ip:203.0.113.7");
    }
}
