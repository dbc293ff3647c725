//! Opaque bearer values: authorization codes and refresh tokens.
//!
//! Values are random bytes encoded as base64url. Only their SHA-256 hex digest is
//! ever persisted, so a database leak does not expose usable codes or tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const CODE_BYTES: usize = 32;
pub const REFRESH_TOKEN_BYTES: usize = 48;

/// Returns `n_bytes` of OS randomness, base64url encoded without padding.
pub fn generate(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercase hex SHA-256 of the value, the form stored and looked up.
pub fn digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
