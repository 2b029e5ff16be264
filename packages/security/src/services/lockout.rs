//! Failed-login tracking with temporary source blocking
//!
//! Repeated login failures from one source address are counted; once the
//! threshold is reached the address is blocked for the configured
//! duration. Counters live in process memory and expire lazily, the same
//! way the rate limiter's ledger does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::clock::{Clock, SystemClock};
use crate::services::audit::{AuditLogger, RequestContext, Severity};

/// Thresholds for blocking a source address.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Failures before the address is blocked.
    pub max_failures: u32,
    /// How long a block lasts.
    pub block_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            block_duration: Duration::hours(1),
        }
    }
}

/// Per-address failure counters and active blocks.
pub struct LoginTracker {
    failures: Mutex<HashMap<String, u32>>,
    blocked_until: Mutex<HashMap<String, DateTime<Utc>>>,
    policy: LockoutPolicy,
    clock: Arc<dyn Clock>,
}

impl LoginTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: LockoutPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            failures: Mutex::new(HashMap::new()),
            blocked_until: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    /// Record a failed login from the request's source address.
    ///
    /// Emits a `LOGIN_FAILED` event and, once the failure count reaches
    /// the policy threshold, blocks the address for the configured
    /// duration. Returns the updated failure count.
    pub fn record_failure(
        &self,
        audit: &AuditLogger,
        ctx: &RequestContext,
        identity: Option<&str>,
    ) -> u32 {
        let count = {
            let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
            let count = failures.entry(ctx.source_address.clone()).or_insert(0);
            *count += 1;
            *count
        };

        audit.log_event(
            ctx,
            "LOGIN_FAILED",
            json!({
                "identity": identity.unwrap_or("unknown"),
                "failures": count,
            }),
            Severity::Warning,
        );

        if count >= self.policy.max_failures {
            let until = self.clock.now() + self.policy.block_duration;
            self.blocked_until
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(ctx.source_address.clone(), until);
            tracing::warn!(
                ip = %ctx.source_address,
                until = %until,
                "source address blocked after repeated login failures"
            );
        }

        count
    }

    /// Whether the address is currently blocked. Expired blocks are
    /// removed on the way out.
    pub fn is_blocked(&self, address: &str) -> bool {
        let mut blocked = self.blocked_until.lock().unwrap_or_else(|e| e.into_inner());
        match blocked.get(address) {
            Some(until) if *until > self.clock.now() => true,
            Some(_) => {
                blocked.remove(address);
                false
            }
            None => false,
        }
    }

    /// Current failure count for the address.
    pub fn failure_count(&self, address: &str) -> u32 {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Forget failures and any block for the address, typically after a
    /// successful login.
    pub fn clear(&self, address: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(address);
        self.blocked_until
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::audit::MemorySink;

    fn fixtures() -> (LoginTracker, AuditLogger, MemorySink, RequestContext) {
        let sink = MemorySink::default();
        let audit = AuditLogger::with_sink(Arc::new(sink.clone()));
        let tracker = LoginTracker::new(LockoutPolicy::default());
        let ctx = RequestContext::anonymous("203.0.113.9", "test-agent");
        (tracker, audit, sink, ctx)
    }

    #[test]
    fn test_failures_accumulate_and_block_at_threshold() {
        let (tracker, audit, _sink, ctx) = fixtures();

        for expected in 1..=4 {
            assert_eq!(tracker.record_failure(&audit, &ctx, Some("fatima")), expected);
            assert!(!tracker.is_blocked(&ctx.source_address));
        }

        assert_eq!(tracker.record_failure(&audit, &ctx, Some("fatima")), 5);
        assert!(tracker.is_blocked(&ctx.source_address));
    }

    #[test]
    fn test_each_failure_emits_an_event() {
        let (tracker, audit, sink, ctx) = fixtures();

        tracker.record_failure(&audit, &ctx, Some("fatima"));
        tracker.record_failure(&audit, &ctx, None);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_type == "LOGIN_FAILED"));
        assert_eq!(events[1].details["identity"], "unknown");
    }

    #[test]
    fn test_clear_resets_count_and_block() {
        let (tracker, audit, _sink, ctx) = fixtures();

        for _ in 0..5 {
            tracker.record_failure(&audit, &ctx, Some("fatima"));
        }
        assert!(tracker.is_blocked(&ctx.source_address));

        tracker.clear(&ctx.source_address);
        assert!(!tracker.is_blocked(&ctx.source_address));
        assert_eq!(tracker.failure_count(&ctx.source_address), 0);
    }

    #[test]
    fn test_block_expires_with_the_clock() {
        use crate::test_support::FixedClock;

        let clock = FixedClock::start_of_2025();
        let tracker =
            LoginTracker::with_clock(LockoutPolicy::default(), Arc::new(clock.clone()));
        let audit = AuditLogger::with_sink(Arc::new(MemorySink::default()));
        let ctx = RequestContext::anonymous("203.0.113.9", "test-agent");

        for _ in 0..5 {
            tracker.record_failure(&audit, &ctx, None);
        }
        assert!(tracker.is_blocked(&ctx.source_address));

        clock.advance(Duration::hours(1) + Duration::seconds(1));
        assert!(!tracker.is_blocked(&ctx.source_address));
    }
}
