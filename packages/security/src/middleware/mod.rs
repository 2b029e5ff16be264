//! Request-pipeline layer of the security subsystem
//!
//! - [`rate_limit`]: sliding-window attempt limiting and client address
//!   extraction
//! - [`csrf`]: session-bound token issuance and validation
//! - [`guards`]: the ordered guard chain (allowlist, rate limit, fresh
//!   login) composed around protected operations
//! - [`security_headers`]: response header hardening middleware

pub mod csrf;
pub mod guards;
pub mod rate_limit;
pub mod security_headers;

pub use guards::{
    FreshLoginGuard, Guard, GuardChain, GuardContext, GuardVerdict, IpAllowlistGuard,
    LoginFreshness, Protected, RateLimitGuard, Redirect,
};
pub use rate_limit::{extract_client_ip, RateLimit, RateLimiter};
pub use security_headers::{security_headers, SecurityHeadersConfig};
