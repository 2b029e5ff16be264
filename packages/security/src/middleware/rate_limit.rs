//! Sliding-window rate limiting
//!
//! Tracks attempt timestamps per caller-supplied key (typically the source
//! address) and rejects a key once it accumulates too many attempts inside
//! a trailing window. Eviction is lazy: stale timestamps are pruned on
//! every check, there is no background sweep.
//!
//! The ledger lives in process memory. When the service runs as multiple
//! worker processes each worker counts independently, so a client spread
//! across workers can exceed the intended global limit; replacing the
//! ledger with a shared external store is the documented fix if that
//! matters for a deployment.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};

/// Limit applied to a single check: `max_attempts` within `window`.
///
/// Supplied per call rather than fixed per limiter, so one ledger can
/// serve endpoints with different budgets.
#[derive(Debug, Clone)]
pub struct RateLimit {
    pub max_attempts: usize,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// Default login budget: 5 attempts per 15 minutes.
    pub fn login() -> Self {
        Self::new(5, Duration::minutes(15))
    }
}

/// Per-key attempt ledger with sliding-window eviction.
///
/// Owned by the composition root and passed by reference into the guard
/// chain; there is no process-global instance. A single coarse lock
/// serializes prune+append per ledger access, so concurrent attempts from
/// the same source cannot lose updates.
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Check whether `key` is over its budget.
    ///
    /// Prunes timestamps older than the window, then compares the
    /// surviving count against the budget. Returns the denial message when
    /// limited. Checking never records an attempt; callers record only
    /// attempts that are allowed to proceed.
    pub fn is_limited(&self, key: &str, limit: &RateLimit) -> Option<String> {
        let cutoff = self.clock.now() - limit.window;
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        let current = match attempts.get_mut(key) {
            Some(entries) => {
                entries.retain(|at| *at > cutoff);
                entries.len()
            }
            None => 0,
        };

        if current >= limit.max_attempts {
            Some(format!(
                "Too many attempts. Try again in {} minutes",
                limit.window.num_minutes()
            ))
        } else {
            None
        }
    }

    /// Record an attempt for `key` at the current instant.
    ///
    /// Recording happens for every allowed attempt, including ones that
    /// later fail for other reasons (wrong password, say), so repeated
    /// failures still count toward the limit.
    pub fn record(&self, key: &str) {
        let now = self.clock.now();
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .push(now);
    }

    /// Number of keys currently tracked (for tests).
    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the client address from request headers or connection info.
///
/// Prefers `X-Forwarded-For` (first entry), then `X-Real-IP`, then the
/// connection's remote address; each header candidate must parse as an IP
/// address to be trusted. Returns `"unknown"` when nothing usable exists.
pub fn extract_client_ip(headers: &HeaderMap, remote_addr: Option<IpAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                let ip = ip.trim();
                if ip.parse::<IpAddr>().is_ok() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            let ip = value.trim();
            if ip.parse::<IpAddr>().is_ok() {
                return ip.to_string();
            }
        }
    }

    if let Some(addr) = remote_addr {
        return addr.to_string();
    }

    tracing::warn!("Could not determine client address for rate limiting");
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use crate::test_support::FixedClock;

    fn limiter() -> (RateLimiter, FixedClock) {
        let clock = FixedClock::start_of_2025();
        (RateLimiter::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_under_budget_is_not_limited() {
        let (limiter, _clock) = limiter();
        let limit = RateLimit::new(3, Duration::minutes(15));

        limiter.record("203.0.113.9");
        limiter.record("203.0.113.9");
        assert_eq!(limiter.is_limited("203.0.113.9", &limit), None);
    }

    #[test]
    fn test_budget_exhaustion_limits_until_window_passes() {
        let (limiter, clock) = limiter();
        let limit = RateLimit::new(3, Duration::minutes(15));

        for _ in 0..3 {
            limiter.record("203.0.113.9");
        }
        let message = limiter.is_limited("203.0.113.9", &limit);
        assert!(message.is_some());
        assert!(message.unwrap().contains("15 minutes"));

        // Advancing past the window with no new attempts clears the key.
        clock.advance(Duration::minutes(15) + Duration::seconds(1));
        assert_eq!(limiter.is_limited("203.0.113.9", &limit), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter();
        let limit = RateLimit::new(1, Duration::minutes(15));

        limiter.record("203.0.113.9");
        assert!(limiter.is_limited("203.0.113.9", &limit).is_some());
        assert_eq!(limiter.is_limited("198.51.100.42", &limit), None);
    }

    #[test]
    fn test_checking_does_not_record() {
        let (limiter, _clock) = limiter();
        let limit = RateLimit::new(1, Duration::minutes(15));

        for _ in 0..5 {
            assert_eq!(limiter.is_limited("203.0.113.9", &limit), None);
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_window_is_sliding_not_bucketed() {
        let (limiter, clock) = limiter();
        let limit = RateLimit::new(2, Duration::minutes(10));

        limiter.record("203.0.113.9");
        clock.advance(Duration::minutes(6));
        limiter.record("203.0.113.9");
        assert!(limiter.is_limited("203.0.113.9", &limit).is_some());

        // Five more minutes: the first attempt has aged out, the second
        // is still inside the trailing window.
        clock.advance(Duration::minutes(5));
        assert_eq!(limiter.is_limited("203.0.113.9", &limit), None);
    }

    #[test]
    fn test_extract_client_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 10.0.0.1"),
        );
        assert_eq!(extract_client_ip(&headers, None), "203.0.113.1");
    }

    #[test]
    fn test_extract_client_ip_invalid_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.42"));
        assert_eq!(extract_client_ip(&headers, None), "198.51.100.42");
    }

    #[test]
    fn test_extract_client_ip_falls_back_to_remote_addr() {
        let headers = HeaderMap::new();
        let remote = "192.0.2.7".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, Some(remote)), "192.0.2.7");
        assert_eq!(extract_client_ip(&headers, None), "unknown");
    }
}
