//! Credential hashing and verification
//!
//! Credentials are salted PBKDF2-HMAC-SHA-256 digests serialized as
//! `"<salt>:<digest>"`, with a 16-byte hex-encoded salt and a 32-byte
//! hex-encoded digest. The iteration count is fixed; there is no
//! per-credential negotiation. A credential is immutable once created and
//! replaced wholesale on password change.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Random salt length in bytes (hex-encoded to twice this many characters).
const SALT_BYTES: usize = 16;

/// Derived digest length in bytes.
const DIGEST_BYTES: usize = 32;

/// Fixed PBKDF2 iteration count.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Hash a password with a freshly generated random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    hash_password_with_salt(password, &hex::encode(salt))
}

/// Hash a password with an explicit salt.
///
/// The salt is the hex string itself: its UTF-8 bytes feed the KDF, so the
/// same (password, salt) pair always yields the same credential string.
pub fn hash_password_with_salt(password: &str, salt: &str) -> String {
    let mut digest = [0u8; DIGEST_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut digest,
    );
    format!("{}:{}", salt, hex::encode(digest))
}

/// Verify a password against a stored credential.
///
/// Fails closed: a stored value without a `:` separator, or with any other
/// unexpected structure, verifies as `false` rather than erroring. The
/// reconstructed credential is compared against the stored one in constant
/// time.
pub fn verify_password(password: &str, credential: &str) -> bool {
    let Some((salt, _digest)) = credential.split_once(':') else {
        return false;
    };
    let recomputed = hash_password_with_salt(password, salt);
    recomputed.as_bytes().ct_eq(credential.as_bytes()).into()
}
