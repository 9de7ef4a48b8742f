//! Secure random tokens and their at-rest hashes.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Entropy of opaque refresh tokens
pub const REFRESH_TOKEN_BYTES: usize = 48;

/// Entropy of session ids
pub const SESSION_ID_BYTES: usize = 16;

/// Entropy of per-device binding tokens
pub const BINDING_TOKEN_BYTES: usize = 24;

/// Entropy of email verification / password reset tokens
pub const ONE_TIME_TOKEN_BYTES: usize = 32;

/// Generate `byte_len` random bytes from the OS-seeded CSPRNG, hex encoded
pub fn generate_secure_token(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hex digest used for every token kept at rest
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
