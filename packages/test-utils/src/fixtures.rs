//! Request and session fixtures in known states

use chrono::{DateTime, Utc};
use claimdesk_security::{RequestContext, Session};

/// Address used by fixtures unless the test cares about the value.
pub const TEST_ADDRESS: &str = "203.0.113.9";

/// User agent used by fixtures.
pub const TEST_USER_AGENT: &str = "claimdesk-tests/1.0";

/// Context for an unauthenticated request from the fixture address.
pub fn anonymous_context() -> RequestContext {
    RequestContext::anonymous(TEST_ADDRESS, TEST_USER_AGENT)
}

/// Context for an authenticated request from the fixture address.
pub fn authenticated_context(actor: &str) -> RequestContext {
    RequestContext::authenticated(actor, TEST_ADDRESS, TEST_USER_AGENT)
}

/// Session whose credentials were last confirmed at `at`.
pub fn session_with_fresh_login(at: DateTime<Utc>) -> Session {
    let mut session = Session::new();
    session.set_last_fresh_login(at);
    session
}
