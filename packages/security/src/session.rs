//! Per-request session state
//!
//! The security subsystem reads and writes exactly two session keys:
//! `csrf_token` and `last_fresh_login`. [`Session`] models the session store
//! as an explicit capability passed into the guards that need it, instead of
//! an ambient global. The host application is responsible for loading and
//! persisting the session around each request.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Session key holding the CSRF token bound to this session.
pub const CSRF_TOKEN_KEY: &str = "csrf_token";

/// Session key holding the last password re-confirmation time (RFC 3339).
pub const LAST_FRESH_LOGIN_KEY: &str = "last_fresh_login";

/// String key-value session store.
#[derive(Debug, Clone, Default)]
pub struct Session {
    values: HashMap<String, String>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Store a session value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a session value, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// The CSRF token bound to this session, if one has been issued.
    pub fn csrf_token(&self) -> Option<&str> {
        self.get(CSRF_TOKEN_KEY)
    }

    /// When credentials were last re-confirmed within this session.
    ///
    /// Returns `None` when the key is absent or does not parse as RFC 3339;
    /// an unparseable value is treated the same as no confirmation at all.
    pub fn last_fresh_login(&self) -> Option<DateTime<Utc>> {
        self.get(LAST_FRESH_LOGIN_KEY)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
    }

    /// Record a credential re-confirmation time.
    pub fn set_last_fresh_login(&mut self, at: DateTime<Utc>) {
        self.insert(LAST_FRESH_LOGIN_KEY, at.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_insert_and_get() {
        let mut session = Session::new();
        assert_eq!(session.get("missing"), None);

        session.insert("key", "value");
        assert_eq!(session.get("key"), Some("value"));

        session.insert("key", "replaced");
        assert_eq!(session.get("key"), Some("replaced"));
    }

    #[test]
    fn test_fresh_login_round_trip() {
        let mut session = Session::new();
        assert_eq!(session.last_fresh_login(), None);

        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        session.set_last_fresh_login(at);
        assert_eq!(session.last_fresh_login(), Some(at));
    }

    #[test]
    fn test_unparseable_fresh_login_reads_as_none() {
        let mut session = Session::new();
        session.insert(LAST_FRESH_LOGIN_KEY, "not-a-timestamp");
        assert_eq!(session.last_fresh_login(), None);
    }
}
