//! Fixed-window rate limiting
//!
//! The store is injected behind [`RateLimitStore`] so single-instance
//! deployments can use the in-process map and multi-instance deployments
//! can point every replica at the same Redis. Both implementations count
//! requests per key inside fixed windows: the first request of a window
//! starts it, and once the count passes the limit the rest of the window
//! is denied.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Denied; retry after roughly this many seconds
    Deny { retry_after_seconds: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Error type for rate-limit stores
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A swappable request counter
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one request against `key` and decides whether to allow it
    async fn check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Decision, RateLimitError>;
}

/// In-process store for single-instance deployments
///
/// Windows are tracked against a monotonic clock. Expired entries are
/// dropped lazily when their key is next checked, so the map stays
/// bounded by the number of distinct active keys.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, WindowState>>,
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    started: Instant,
    count: u32,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> Decision {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            // A poisoned lock only means another check panicked mid-insert;
            // the map is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };

        let state = windows
            .entry(key.to_string())
            .or_insert(WindowState { started: now, count: 0 });

        if now.duration_since(state.started) >= window {
            state.started = now;
            state.count = 0;
        }

        state.count += 1;

        if state.count <= limit {
            Decision::Allow
        } else {
            let elapsed = now.duration_since(state.started);
            let remaining = window.saturating_sub(elapsed);
            Decision::Deny {
                retry_after_seconds: remaining.as_secs().max(1),
            }
        }
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Decision, RateLimitError> {
        Ok(self.check_at(key, limit, window, Instant::now()))
    }
}

/// Redis-backed store shared across replicas
///
/// Uses INCR with an EXPIRE set on the first hit of each window, so the
/// window boundary and count live entirely in Redis.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    connection: ConnectionManager,
}

impl RedisRateLimitStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<Decision, RateLimitError> {
        let mut conn = self.connection.clone();
        let redis_key = format!("ratelimit:{}", key);
        let window_secs = window.as_secs().max(1);

        let count: u32 = redis::cmd("INCR")
            .arg(&redis_key)
            .query_async(&mut conn)
            .await?;

        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&redis_key)
                .arg(window_secs)
                .query_async::<_, ()>(&mut conn)
                .await?;
        }

        if count <= limit {
            Ok(Decision::Allow)
        } else {
            let ttl: i64 = redis::cmd("TTL")
                .arg(&redis_key)
                .query_async(&mut conn)
                .await?;

            Ok(Decision::Deny {
                retry_after_seconds: if ttl > 0 { ttl as u64 } else { window_secs },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_allows_up_to_limit() {
        let store = MemoryRateLimitStore::new();
        let now = Instant::now();

        for _ in 0..5 {
            assert_eq!(store.check_at("k", 5, WINDOW, now), Decision::Allow);
        }
        assert!(!store.check_at("k", 5, WINDOW, now).is_allowed());
    }

    #[test]
    fn test_deny_reports_retry_after() {
        let store = MemoryRateLimitStore::new();
        let start = Instant::now();

        assert!(store.check_at("k", 1, WINDOW, start).is_allowed());

        let later = start + Duration::from_secs(40);
        match store.check_at("k", 1, WINDOW, later) {
            Decision::Deny { retry_after_seconds } => assert_eq!(retry_after_seconds, 20),
            Decision::Allow => panic!("Expected deny"),
        }
    }

    #[test]
    fn test_window_resets() {
        let store = MemoryRateLimitStore::new();
        let start = Instant::now();

        assert!(store.check_at("k", 1, WINDOW, start).is_allowed());
        assert!(!store.check_at("k", 1, WINDOW, start).is_allowed());

        let next_window = start + WINDOW;
        assert!(store.check_at("k", 1, WINDOW, next_window).is_allowed());
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        let now = Instant::now();

        assert!(store.check_at("a", 1, WINDOW, now).is_allowed());
        assert!(store.check_at("b", 1, WINDOW, now).is_allowed());
        assert!(!store.check_at("a", 1, WINDOW, now).is_allowed());
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let store: std::sync::Arc<dyn RateLimitStore> =
            std::sync::Arc::new(MemoryRateLimitStore::new());

        let decision = store.check("k", 2, WINDOW).await.unwrap();
        assert!(decision.is_allowed());
    }
}
