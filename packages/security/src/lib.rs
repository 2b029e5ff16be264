//! Claimdesk security subsystem
//!
//! The security-control layer of the Claimdesk claims platform:
//! credential hashing and verification, password-strength policy, input
//! sanitization, sliding-window rate limiting, CSRF tokens, audit logging,
//! and the guard chain (IP allowlist, rate limit, fresh login) composed
//! around protected operations.
//!
//! The host application is an external collaborator: it supplies a
//! [`RequestContext`] (identity, source address, user agent), the
//! [`Session`] for the request, and — where tests need determinism — a
//! [`Clock`]; the subsystem hands back decisions (allow, deny, redirect,
//! validated token, audit record) for the host's request pipeline to act
//! on.

pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod session;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::SecurityConfig;
pub use error::{ErrorResponse, SecurityError, SecurityResult};
pub use middleware::csrf;
pub use middleware::guards::{
    FreshLoginGuard, Guard, GuardChain, GuardContext, GuardVerdict, IpAllowlistGuard,
    LoginFreshness, Protected, RateLimitGuard, Redirect,
};
pub use middleware::rate_limit::{extract_client_ip, RateLimit, RateLimiter};
pub use middleware::security_headers::{security_headers, SecurityHeadersConfig};
pub use services::audit::{
    AuditLogger, AuditSink, MemorySink, RequestContext, SecurityEvent, SecuritySummary, Severity,
    TracingSink,
};
pub use services::lockout::{LockoutPolicy, LoginTracker};
pub use services::password::{hash_password, hash_password_with_salt, verify_password};
pub use services::policy::{self, PolicyViolation};
pub use services::sanitize::sanitize_input;
pub use services::token::generate_secure_token;
pub use services::upload::{UploadDescriptor, UploadPolicy};
pub use session::Session;
