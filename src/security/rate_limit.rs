//! Fixed-window rate limiting keyed by client address.
//!
//! # Responsibilities
//! - Count requests per client key within fixed, non-overlapping windows
//! - Report limit, remaining budget and window reset for response headers
//! - Evict records whose window has passed
//!
//! # Design Decisions
//! - Counters live in a `DashMap` owned by the limiter, not in global state
//! - The read-modify-write of a record runs under the map's entry lock,
//!   so concurrent requests on one key never lose increments
//! - Time comes from an injected `Clock` so window edges are testable

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Longest accepted window.
pub const MAX_WINDOW_SECS: u64 = 86_400;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;


/// Counter state for one client key.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    /// Requests counted in the current window, including this one.
    pub count: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Write the `X-RateLimit-*` headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        let reset = self.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        if let Ok(value) = HeaderValue::from_str(&reset) {
            headers.insert(X_RATELIMIT_RESET, value);
        }
    }
}

/// Fixed-window counter store.
pub struct FixedWindowLimiter {
    records: DashMap<String, WindowRecord>,
    max_requests: u32,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let window_secs = config.window_secs.clamp(1, MAX_WINDOW_SECS) as i64;
        Self {
            records: DashMap::new(),
            max_requests: config.max_requests,
            window: chrono::Duration::seconds(window_secs),
            clock,
        }
    }

    /// Count one request for `key` and report whether it is within the limit.
    pub fn check(&self, key: &str) -> RateLimitStatus {
        let now = self.clock.now();

        let mut record = self
            .records
            .entry(key.to_owned())
            .or_insert_with(|| WindowRecord {
                count: 0,
                reset_at: now + self.window,
            });

        if now > record.reset_at {
            record.count = 1;
            record.reset_at = now + self.window;
        } else {
            record.count = record.count.saturating_add(1);
        }

        let WindowRecord { count, reset_at } = *record;
        drop(record);

        RateLimitStatus {
            allowed: count <= self.max_requests,
            limit: self.max_requests,
            count,
            remaining: self.max_requests.saturating_sub(count),
            reset_at,
        }
    }

    /// Current count for `key`, if tracked.
    pub fn count_for(&self, key: &str) -> Option<u32> {
        self.records.get(key).map(|r| r.count)
    }

    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Drop records whose window has already passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.records.retain(|_, record| {
            let keep = record.reset_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Periodically purge expired records until shutdown is signalled.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = self.purge_expired();
                        let tracked = self.tracked_keys();
                        metrics::record_rate_limit_keys(tracked);
                        tracing::debug!(removed, tracked, "Rate limit sweep");
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> (FixedWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = RateLimitConfig {
            max_requests,
            window_secs,
            ..RateLimitConfig::default()
        };
        (FixedWindowLimiter::with_clock(&config, clock.clone()), clock)
    }

    #[test]
    fn test_hundred_allowed_then_rejected() {
        let (limiter, _) = limiter(100, 60);
        for i in 1..=100 {
            let status = limiter.check("10.0.0.1");
            assert!(status.allowed, "request {i} should pass");
            assert_eq!(status.remaining, 100 - i);
        }
        let status = limiter.check("10.0.0.1");
        assert!(!status.allowed);
        assert_eq!(status.count, 101);
        assert_eq!(status.remaining, 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        assert!(limiter.check("b").allowed);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_window_reset() {
        let (limiter, clock) = limiter(100, 60);
        let first = limiter.check("k");
        for _ in 0..150 {
            limiter.check("k");
        }
        assert!(!limiter.check("k").allowed);

        // Exactly at the boundary the window has not yet passed.
        clock.advance(Duration::from_secs(60));
        assert!(!limiter.check("k").allowed);

        clock.advance(Duration::from_millis(1));
        let status = limiter.check("k");
        assert!(status.allowed);
        assert_eq!(status.count, 1);
        assert_eq!(status.remaining, 99);
        assert!(status.reset_at > first.reset_at);
    }

    #[test]
    fn test_rejected_requests_keep_counting() {
        let (limiter, _) = limiter(2, 60);
        limiter.check("k");
        limiter.check("k");
        limiter.check("k");
        limiter.check("k");
        assert_eq!(limiter.count_for("k"), Some(4));
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let (limiter, _) = limiter(u32::MAX, 60);
        let threads = 8;
        let per_thread = 500;

        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..per_thread {
                        limiter.check("shared");
                    }
                });
            }
        });

        assert_eq!(limiter.count_for("shared"), Some(threads * per_thread));
    }

    #[test]
    fn test_purge_expired() {
        let (limiter, clock) = limiter(10, 60);
        limiter.check("old");
        clock.advance(Duration::from_secs(30));
        limiter.check("new");
        clock.advance(Duration::from_secs(31));

        assert_eq!(limiter.purge_expired(), 1);
        assert_eq!(limiter.count_for("old"), None);
        assert_eq!(limiter.count_for("new"), Some(1));
    }

    #[test]
    fn test_headers() {
        let (limiter, _) = limiter(100, 60);
        let status = limiter.check("k");
        let mut headers = HeaderMap::new();
        status.apply_headers(&mut headers);

        assert_eq!(headers[X_RATELIMIT_LIMIT], "100");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "99");
        let reset = headers[X_RATELIMIT_RESET].to_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(reset).unwrap();
        assert_eq!(parsed.timestamp_millis(), status.reset_at.timestamp_millis());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let (limiter, _) = limiter(10, 60);
        let (tx, rx) = broadcast::channel(1);
        let handle = Arc::new(limiter).spawn_sweeper(Duration::from_millis(10), rx);
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
