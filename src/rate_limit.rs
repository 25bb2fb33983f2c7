// src/rate_limit.rs
//! Fixed-window rate limiting keyed by client address.
//!
//! Counters live in process memory behind an async lock; restarting the
//! server forgets them. Window boundaries are per-key: each key's window
//! starts at its first request after the previous window lapsed.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

const DEFAULT_LIMIT: u32 = 100;
const DEFAULT_WINDOW_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(limit) = env::var("RATE_LIMIT_PER_MINUTE") {
            if let Ok(val) = limit.parse::<u32>() {
                config.limit = val;
            }
        }

        if let Ok(window) = env::var("RATE_LIMIT_WINDOW_SECONDS") {
            if let Ok(val) = window.parse::<u64>() {
                config.window_seconds = val;
            }
        }

        config
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    started_at: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            limit = config.limit,
            window_seconds = config.window_seconds,
            "Initializing rate limiter"
        );
        Self::with_limits(config.limit, Duration::from_secs(config.window_seconds))
    }

    pub fn with_limits(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Count one request against `key`.
    ///
    /// Exactly `limit` requests are admitted per window; the next one within
    /// the same window is limited with the seconds left until the window
    /// lapses (at least 1, so clients never retry immediately).
    pub async fn check(&self, key: &str) -> RateLimitResult {
        let mut windows = self.windows.write().await;

        // Lapsed windows are pruned on every check; keys come from
        // client-supplied headers, so the map must not grow unbounded.
        let window_len = self.window;
        windows.retain(|_, w| w.started_at.elapsed() < window_len);

        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            started_at: Instant::now(),
        });

        if window.count >= self.limit {
            let elapsed = window.started_at.elapsed().as_secs();
            let retry_after = self.window.as_secs().saturating_sub(elapsed).max(1);
            return RateLimitResult::Limited { retry_after };
        }

        window.count += 1;
        RateLimitResult::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_admits_exactly_the_limit() {
        let limiter = RateLimiter::with_limits(100, Duration::from_secs(60));

        for i in 0..100 {
            assert_eq!(
                limiter.check("10.0.0.1").await,
                RateLimitResult::Allowed,
                "request {} should be admitted",
                i + 1
            );
        }

        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateLimitResult::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::with_limits(2, Duration::from_secs(60));

        assert_eq!(limiter.check("10.0.0.1").await, RateLimitResult::Allowed);
        assert_eq!(limiter.check("10.0.0.1").await, RateLimitResult::Allowed);
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateLimitResult::Limited { .. }
        ));

        assert_eq!(limiter.check("10.0.0.2").await, RateLimitResult::Allowed);
    }

    #[tokio::test]
    async fn test_window_lapse_resets_the_counter() {
        let limiter = RateLimiter::with_limits(1, Duration::from_millis(20));

        assert_eq!(limiter.check("10.0.0.1").await, RateLimitResult::Allowed);
        assert!(matches!(
            limiter.check("10.0.0.1").await,
            RateLimitResult::Limited { .. }
        ));

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(limiter.check("10.0.0.1").await, RateLimitResult::Allowed);
    }

    #[tokio::test]
    async fn test_retry_after_is_positive() {
        let limiter = RateLimiter::with_limits(1, Duration::from_secs(60));

        limiter.check("10.0.0.1").await;
        match limiter.check("10.0.0.1").await {
            RateLimitResult::Limited { retry_after } => {
                assert!(retry_after >= 1);
                assert!(retry_after <= 60);
            }
            RateLimitResult::Allowed => panic!("second request should be limited"),
        }
    }

    #[tokio::test]
    async fn test_lapsed_windows_are_pruned_on_check() {
        let limiter = RateLimiter::with_limits(1, Duration::from_millis(10));

        // Many one-off clients, as with spoofed forwarding headers
        for i in 0..50 {
            limiter.check(&format!("10.0.0.{}", i)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        limiter.check("10.0.1.1").await;

        assert_eq!(limiter.windows.read().await.len(), 1);
    }

    #[test]
    fn test_config_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit, 100);
        assert_eq!(config.window_seconds, 60);
    }
}
