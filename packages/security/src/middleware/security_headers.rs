//! Security headers middleware
//!
//! Adds HTTP security headers to every response passing through:
//!
//! - X-Frame-Options: DENY — no iframe embedding
//! - X-Content-Type-Options: nosniff — no MIME sniffing
//! - X-XSS-Protection: legacy filter hint for older browsers
//! - Referrer-Policy: strict-origin-when-cross-origin
//! - Content-Security-Policy for the server-rendered claim forms (self
//!   plus the CDN that serves the form assets)
//! - Strict-Transport-Security, only when HSTS is enabled and the request
//!   actually arrived over HTTPS (per RFC 6797 the header must be ignored
//!   on plain HTTP anyway)

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

static X_FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");
static X_CONTENT_TYPE_OPTIONS: HeaderName = HeaderName::from_static("x-content-type-options");
static X_XSS_PROTECTION: HeaderName = HeaderName::from_static("x-xss-protection");
static REFERRER_POLICY: HeaderName = HeaderName::from_static("referrer-policy");
static CONTENT_SECURITY_POLICY: HeaderName = HeaderName::from_static("content-security-policy");
static STRICT_TRANSPORT_SECURITY: HeaderName = HeaderName::from_static("strict-transport-security");

/// Configuration for the security headers middleware.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeadersConfig {
    /// Whether to send Strict-Transport-Security on HTTPS responses.
    /// Enable only for production deployments behind TLS.
    pub enable_hsts: bool,
}

impl SecurityHeadersConfig {
    /// Production configuration: HSTS on.
    pub fn production() -> Self {
        Self { enable_hsts: true }
    }

    /// Development configuration: no HSTS.
    pub fn development() -> Self {
        Self::default()
    }
}

/// Whether the request arrived over HTTPS, honoring the reverse proxy's
/// `x-forwarded-proto` before falling back to the request scheme.
fn is_https_request(request: &Request<Body>) -> bool {
    if let Some(proto) = request.headers().get("x-forwarded-proto") {
        if let Ok(proto_str) = proto.to_str() {
            return proto_str.eq_ignore_ascii_case("https");
        }
    }

    request
        .uri()
        .scheme_str()
        .is_some_and(|s| s.eq_ignore_ascii_case("https"))
}

/// Security headers middleware.
pub async fn security_headers(
    State(config): State<SecurityHeadersConfig>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let is_https = is_https_request(&request);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS.clone(), HeaderValue::from_static("DENY"));
    headers.insert(
        X_CONTENT_TYPE_OPTIONS.clone(),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        X_XSS_PROTECTION.clone(),
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        REFERRER_POLICY.clone(),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // Server-rendered forms with assets from the CDN; everything else
    // same-origin only.
    headers.insert(
        CONTENT_SECURITY_POLICY.clone(),
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
             style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
             font-src 'self' https://cdn.jsdelivr.net; \
             img-src 'self' data: https:",
        ),
    );

    if config.enable_hsts && is_https {
        headers.insert(
            STRICT_TRANSPORT_SECURITY.clone(),
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
