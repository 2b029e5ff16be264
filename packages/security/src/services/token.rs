//! Opaque security tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Entropy carried by a CSRF token, in bytes.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Generate a URL-safe random token carrying `n_bytes` of entropy.
///
/// Tokens are opaque: callers compare them for equality and never parse
/// them. The encoding is unpadded URL-safe base64 so tokens can travel in
/// query strings and form fields unescaped.
pub fn generate_secure_token(n_bytes: usize) -> String {
    let mut buf = vec![0u8; n_bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
