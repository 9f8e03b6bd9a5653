//! Secrets: session tokens, API keys and password hashes

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 48;

/// Prefix of generated API keys
pub const API_KEY_PREFIX: &str = "vc_";

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn new_salt() -> String {
    random_string(SALT_LEN)
}

/// Opaque session token
pub fn new_session_token() -> String {
    random_string(TOKEN_LEN)
}

pub fn new_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, random_string(TOKEN_LEN))
}

/// Hex SHA-256 of `salt || secret`
pub fn hash_secret(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a secret against a stored hash
pub fn verify_secret(salt: &str, secret: &str, expected_hash: &str) -> bool {
    constant_time_compare(hash_secret(salt, secret).as_bytes(), expected_hash.as_bytes())
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
