//! Session-bound CSRF tokens
//!
//! A token is created lazily the first time a session needs one and lives
//! exactly as long as the session; it is never rotated automatically.
//! Validation compares the presented token against the stored one in
//! constant time.

use subtle::ConstantTimeEq;

use crate::services::token::{generate_secure_token, DEFAULT_TOKEN_BYTES};
use crate::session::{Session, CSRF_TOKEN_KEY};

/// Return the session's CSRF token, creating one if absent.
///
/// Idempotent: repeated calls on the same session return the same token.
pub fn issue(session: &mut Session) -> String {
    if let Some(token) = session.csrf_token() {
        return token.to_string();
    }
    let token = generate_secure_token(DEFAULT_TOKEN_BYTES);
    session.insert(CSRF_TOKEN_KEY, token.clone());
    token
}

/// Whether `presented` matches the session's stored token.
///
/// An empty presented token, or a session with no token, never validates.
pub fn validate(session: &Session, presented: &str) -> bool {
    if presented.is_empty() {
        return false;
    }
    match session.csrf_token() {
        Some(stored) => stored.as_bytes().ct_eq(presented.as_bytes()).into(),
        None => false,
    }
}
