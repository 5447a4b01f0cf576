// src/archive/hash.rs

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use blake3::Hasher;
use sha2::{Digest, Sha256};

/// Hash of a single archive entry's content.
///
/// Only compared against earlier hashes of the same key, never sent
/// anywhere, so any stable digest works.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Hash of a whole deployment package, in the format Lambda reports as
/// `CodeSha256`: base64 of the SHA-256 digest.
pub fn package_hash(bytes: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(bytes))
}
