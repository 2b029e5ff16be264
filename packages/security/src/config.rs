//! Security subsystem configuration
//!
//! Loaded from environment variables with development-friendly defaults.
//! The host application owns process-wide configuration; this struct
//! carries only the knobs the security layer consumes.

use std::collections::HashSet;
use std::env;

use anyhow::{bail, Context, Result};
use chrono::Duration;

use crate::middleware::rate_limit::RateLimit;
use crate::services::lockout::LockoutPolicy;
use crate::services::upload::UploadPolicy;

/// Extensions accepted for claim attachments when none are configured.
const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "docx"];

/// Upload ceiling in megabytes when none is configured.
const DEFAULT_MAX_UPLOAD_MB: u64 = 25;

/// Configuration consumed by the security layer.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Accepted upload extensions (`ALLOWED_EXTENSIONS`, comma-separated).
    pub allowed_extensions: HashSet<String>,

    /// Upload size ceiling in megabytes (`MAX_UPLOAD_MB`).
    pub max_upload_mb: u64,

    /// Addresses admitted by the allowlist guard (`IP_ALLOWLIST`,
    /// comma-separated). Empty means the guard admits everyone.
    pub ip_allowlist: Vec<String>,

    /// Login attempts per window (`LOGIN_MAX_ATTEMPTS`, default 5).
    pub login_max_attempts: usize,

    /// Login rate-limit window in minutes (`LOGIN_WINDOW_MINUTES`,
    /// default 15).
    pub login_window_minutes: i64,

    /// Fresh-login recency window in minutes (`FRESH_LOGIN_MINUTES`,
    /// default 30).
    pub fresh_login_minutes: i64,

    /// Failures before an address is blocked (`LOCKOUT_MAX_FAILURES`,
    /// default 5).
    pub lockout_max_failures: u32,

    /// Block duration in minutes (`LOCKOUT_MINUTES`, default 60).
    pub lockout_minutes: i64,

    /// Whether responses carry HSTS (`ENVIRONMENT` == "production").
    pub enable_hsts: bool,
}

impl SecurityConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let allowed_extensions = match env::var("ALLOWED_EXTENSIONS") {
            Ok(raw) => {
                let extensions: HashSet<String> = raw
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect();
                if extensions.is_empty() {
                    bail!("ALLOWED_EXTENSIONS is set but contains no extensions");
                }
                extensions
            }
            Err(_) => DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        };

        let max_upload_mb: u64 = env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_MB.to_string())
            .parse()
            .context("Invalid MAX_UPLOAD_MB value")?;
        if max_upload_mb == 0 {
            bail!("MAX_UPLOAD_MB must be greater than zero");
        }

        let ip_allowlist = env::var("IP_ALLOWLIST")
            .map(|raw| {
                raw.split(',')
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            allowed_extensions,
            max_upload_mb,
            ip_allowlist,

            login_max_attempts: env::var("LOGIN_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid LOGIN_MAX_ATTEMPTS value")?,

            login_window_minutes: env::var("LOGIN_WINDOW_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("Invalid LOGIN_WINDOW_MINUTES value")?,

            fresh_login_minutes: env::var("FRESH_LOGIN_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid FRESH_LOGIN_MINUTES value")?,

            lockout_max_failures: env::var("LOCKOUT_MAX_FAILURES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid LOCKOUT_MAX_FAILURES value")?,

            lockout_minutes: env::var("LOCKOUT_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("Invalid LOCKOUT_MINUTES value")?,

            enable_hsts: env::var("ENVIRONMENT")
                .map(|environment| environment.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        })
    }

    /// Upload policy derived from this configuration.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.allowed_extensions.iter().cloned(), self.max_upload_mb)
    }

    /// Login rate limit derived from this configuration.
    pub fn login_rate_limit(&self) -> RateLimit {
        RateLimit::new(
            self.login_max_attempts,
            Duration::minutes(self.login_window_minutes),
        )
    }

    /// Fresh-login recency window.
    pub fn fresh_login_max_age(&self) -> Duration {
        Duration::minutes(self.fresh_login_minutes)
    }

    /// Lockout thresholds derived from this configuration.
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failures: self.lockout_max_failures,
            block_duration: Duration::minutes(self.lockout_minutes),
        }
    }

}
