//! Credential primitives: salted password digests and opaque session tokens
//!
//! Pure functions only; no HTTP framework or database dependencies here.
//! Token persistence and middleware live in the API service.

use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const SALT_LEN: usize = 16;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn digest_hex(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

/// Hash a password with a fresh random salt
///
/// Stored form is `<salt hex>$<sha256 hex>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = to_hex(&salt);
    let digest = digest_hex(&salt_hex, password);
    format!("{}${}", salt_hex, digest)
}

/// Verify a candidate password against a stored `salt$digest` value
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest)) = stored.split_once('$') else {
        return false;
    };
    digest_hex(salt_hex, password) == digest
}

/// Generate an opaque bearer token
///
/// The token carries no structure; identity comes from the sessions table.
pub fn generate_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}
