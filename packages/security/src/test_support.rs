//! Crate-local test doubles for the security subsystem's own unit tests.
//!
//! The inline `#[cfg(test)]` modules in this crate need a controllable
//! [`Clock`](crate::clock::Clock), but the shared `claimdesk-test-utils`
//! crate depends on this one, so reaching for its `FixedClock` from an
//! in-crate unit test would link two distinct builds of `claimdesk-security`
//! (the one under test and the one behind the dev-dependency cycle) and the
//! `Clock` trait would fail to unify. Integration tests under `tests/` are
//! unaffected and continue to use `claimdesk_test_utils::FixedClock`.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clock::Clock;

/// Clock that only moves when a test advances it.
///
/// Clones share the same underlying instant, so a clone handed to the
/// component under test observes every [`advance`](FixedClock::advance)
/// made through the original.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Clock frozen at 2025-01-01 00:00:00 UTC, a convenient epoch for
    /// assertions.
    pub fn start_of_2025() -> Self {
        Self::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
