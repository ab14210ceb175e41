//! Password hashing — PBKDF2-HMAC-SHA256 with a per-profile random salt.
//!
//! Stored form: `base64(salt)$base64(hash)`. Verification re-derives and
//! compares in constant time.

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut hash);
    hash
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt);
    let b64 = base64::engine::general_purpose::STANDARD;
    format!("{}${}", b64.encode(salt), b64.encode(hash))
}

/// Verify a password against a stored `salt$hash` string.
///
/// Malformed stored values verify as false — they never panic and never
/// succeed.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let b64 = base64::engine::general_purpose::STANDARD;
    let Some((salt_b64, hash_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (b64.decode(salt_b64), b64.decode(hash_b64)) else {
        return false;
    };
    if expected.len() != HASH_LENGTH {
        return false;
    }

    let derived = derive(password, &salt);
    derived.ct_eq(expected.as_slice()).into()
}
