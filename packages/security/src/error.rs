//! Error handling for the security subsystem
//!
//! This module provides a unified error type using thiserror, with HTTP
//! status code mapping via Axum's IntoResponse trait. Every variant is a
//! recoverable-by-caller condition surfaced as a value; the subsystem never
//! terminates the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Wire response body for denied requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable denial message.
    pub error: String,
}

/// Security-control error taxonomy.
#[derive(Error, Debug)]
pub enum SecurityError {
    /// Password failed the strength policy; carries every violated rule.
    #[error("weak password: {}", .0.join("; "))]
    WeakPassword(Vec<String>),

    /// Too many attempts within the sliding window.
    #[error("{message}")]
    RateLimitExceeded {
        /// Ledger key that exhausted its budget (typically the source
        /// address); carried for logging, not shown to the caller.
        key: String,
        message: String,
        retry_after_minutes: i64,
    },

    /// Presented CSRF token is missing or does not match the session's.
    #[error("invalid or missing CSRF token")]
    CsrfMismatch,

    /// Authenticated session is too old for a sensitive operation.
    #[error("re-authentication required")]
    StaleLogin,

    /// Caller's address is not on the configured allowlist.
    #[error("Access denied")]
    IpNotAllowed,

    /// Upload rejected (disallowed extension or oversize).
    #[error("{0}")]
    InvalidUpload(String),
}

impl SecurityError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::WeakPassword(_) | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::StaleLogin => StatusCode::UNAUTHORIZED,
            Self::CsrfMismatch | Self::IpNotAllowed => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Stable error code string for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::RateLimitExceeded { .. } => "RATE_LIMITED",
            Self::CsrfMismatch => "CSRF_MISMATCH",
            Self::StaleLogin => "STALE_LOGIN",
            Self::IpNotAllowed => "IP_NOT_ALLOWED",
            Self::InvalidUpload(_) => "INVALID_UPLOAD",
        }
    }

    /// Log the error with severity matching its status class.
    pub fn log(&self) {
        let status = self.status_code();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Request denied"
            );
        } else {
            tracing::debug!(
                error = %self,
                code = self.error_code(),
                status = status.as_u16(),
                "Request rejected"
            );
        }
    }
}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        // For rate limiting, add Retry-After header
        if let Self::RateLimitExceeded {
            retry_after_minutes,
            ..
        } = &self
        {
            let retry_after_secs = retry_after_minutes * 60;
            return (
                status,
                [("Retry-After", retry_after_secs.to_string())],
                Json(body),
            )
                .into_response();
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
