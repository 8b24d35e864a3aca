use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Hex-encoded SHA256 of a token string.
///
/// Used wherever a token has to become a storage key, so raw tokens never
/// end up in Redis dumps or logs.
pub fn token_digest(token: &str) -> String {
    hex::encode(sha256(token.as_bytes()))
}
