//! Ordered guard chain around protected operations
//!
//! Guards are explicit objects sharing one [`Guard::check`] capability and
//! applied in order by a [`GuardChain`]; the first non-allow verdict
//! short-circuits the chain before later guards or the operation run.
//! Checks execute synchronously on the calling thread; only the wrapped
//! operation itself (and its audit record) is asynchronous.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::clock::{Clock, SystemClock};
use crate::error::SecurityError;
use crate::middleware::rate_limit::{RateLimit, RateLimiter};
use crate::services::audit::{AuditLogger, RequestContext, Severity};
use crate::session::Session;

/// How long a credential confirmation stays fresh.
const DEFAULT_FRESH_LOGIN_MINUTES: i64 = 30;

/// Re-authentication step a redirect verdict sends the caller to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Full login: no authenticated identity at all.
    Login,
    /// Password re-confirmation for an already-authenticated session.
    ConfirmPassword,
}

/// Outcome of a single guard, or of the whole chain.
#[derive(Debug)]
pub enum GuardVerdict {
    /// Pass control to the next guard (or the operation).
    Allow,
    /// Stop with a denial the caller turns into an error response.
    Deny(SecurityError),
    /// Stop and send the caller to a re-authentication step.
    Redirect(Redirect),
}

/// State every guard inspects: the request identity plus the mutable
/// session, with the audit logger for recording denials.
pub struct GuardContext<'a> {
    pub request: &'a RequestContext,
    pub session: &'a mut Session,
    pub audit: &'a AuditLogger,
}

/// A single link in the chain.
pub trait Guard: Send + Sync {
    fn check(&self, cx: &mut GuardContext<'_>) -> GuardVerdict;
}

/// Denies callers whose address is absent from a non-empty allowlist.
///
/// An empty allowlist admits everyone; that is the "not configured" state,
/// not a lockout.
pub struct IpAllowlistGuard {
    allowlist: HashSet<String>,
}

impl IpAllowlistGuard {
    pub fn new(allowlist: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowlist: allowlist.into_iter().collect(),
        }
    }
}

impl Guard for IpAllowlistGuard {
    fn check(&self, cx: &mut GuardContext<'_>) -> GuardVerdict {
        if self.allowlist.is_empty() || self.allowlist.contains(&cx.request.source_address) {
            return GuardVerdict::Allow;
        }

        cx.audit.log_event(
            cx.request,
            "IP_BLOCKED",
            json!(format!(
                "Access denied for IP: {}",
                cx.request.source_address
            )),
            Severity::Warning,
        );
        GuardVerdict::Deny(SecurityError::IpNotAllowed)
    }
}

/// Denies callers over their attempt budget; records allowed attempts.
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    limit: RateLimit,
}

impl RateLimitGuard {
    pub fn new(limiter: Arc<RateLimiter>, limit: RateLimit) -> Self {
        Self { limiter, limit }
    }
}

impl Guard for RateLimitGuard {
    fn check(&self, cx: &mut GuardContext<'_>) -> GuardVerdict {
        let key = &cx.request.source_address;
        if let Some(message) = self.limiter.is_limited(key, &self.limit) {
            tracing::warn!(ip = %key, "Rate limit exceeded");
            return GuardVerdict::Deny(SecurityError::RateLimitExceeded {
                key: key.clone(),
                message,
                retry_after_minutes: self.limit.window.num_minutes(),
            });
        }

        // The attempt is allowed to proceed, so it counts toward the
        // budget even if it later fails for other reasons.
        self.limiter.record(key);
        GuardVerdict::Allow
    }
}

/// Recency of the session's last credential confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFreshness {
    /// No authenticated identity on the request.
    Unauthenticated,
    /// Authenticated, but never confirmed or confirmed too long ago.
    NeedsFreshLogin,
    /// Confirmed within the window.
    Fresh,
}

/// Requires a recent credential confirmation for sensitive operations.
///
/// A stale session is redirected to re-confirmation rather than denied
/// outright; it becomes [`LoginFreshness::Fresh`] only after the caller
/// re-confirms credentials and the host calls [`FreshLoginGuard::confirm`].
pub struct FreshLoginGuard {
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl FreshLoginGuard {
    pub fn new() -> Self {
        Self::with_clock(
            Duration::minutes(DEFAULT_FRESH_LOGIN_MINUTES),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { max_age, clock }
    }

    /// Classify the session without side effects.
    pub fn freshness(&self, request: &RequestContext, session: &Session) -> LoginFreshness {
        if !request.is_authenticated() {
            return LoginFreshness::Unauthenticated;
        }
        match session.last_fresh_login() {
            Some(at) if self.clock.now() - at <= self.max_age => LoginFreshness::Fresh,
            _ => LoginFreshness::NeedsFreshLogin,
        }
    }

    /// Record a successful credential re-confirmation.
    pub fn confirm(&self, session: &mut Session) {
        session.set_last_fresh_login(self.clock.now());
    }
}

impl Default for FreshLoginGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Guard for FreshLoginGuard {
    fn check(&self, cx: &mut GuardContext<'_>) -> GuardVerdict {
        match self.freshness(cx.request, cx.session) {
            LoginFreshness::Unauthenticated => GuardVerdict::Redirect(Redirect::Login),
            LoginFreshness::NeedsFreshLogin => GuardVerdict::Redirect(Redirect::ConfirmPassword),
            LoginFreshness::Fresh => GuardVerdict::Allow,
        }
    }
}

/// Outcome of running a protected operation through the chain.
#[derive(Debug)]
pub enum Protected<T, E> {
    /// Every guard allowed; the operation ran and this is its result.
    Completed(Result<T, E>),
    /// A guard denied before the operation ran.
    Denied(SecurityError),
    /// A guard redirected to a re-authentication step.
    Redirected(Redirect),
}

/// Ordered list of guards applied around a protected operation.
#[derive(Default)]
pub struct GuardChain {
    guards: Vec<Box<dyn Guard>>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard; guards run in insertion order.
    pub fn with_guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Run every guard in order; the first non-allow verdict wins.
    pub fn check(&self, cx: &mut GuardContext<'_>) -> GuardVerdict {
        for guard in &self.guards {
            match guard.check(cx) {
                GuardVerdict::Allow => continue,
                verdict => return verdict,
            }
        }
        GuardVerdict::Allow
    }

    /// Run the chain, then the operation under audit.
    ///
    /// The operation and its audit record run only when every guard
    /// allows; the audit wrapper logs SUCCESS or FAILED and returns the
    /// operation's result unchanged.
    pub async fn protect<T, E, Fut>(
        &self,
        cx: &mut GuardContext<'_>,
        action: &str,
        resource_type: &str,
        resource_id: Option<&str>,
        operation: Fut,
    ) -> Protected<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match self.check(cx) {
            GuardVerdict::Allow => {}
            GuardVerdict::Deny(err) => return Protected::Denied(err),
            GuardVerdict::Redirect(to) => return Protected::Redirected(to),
        }

        Protected::Completed(
            cx.audit
                .audited(cx.request, action, resource_type, resource_id, None, operation)
                .await,
        )
    }
}
