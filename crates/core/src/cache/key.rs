//! Cache key construction and hashing.

use sha2::{Digest, Sha256};

/// Build the cache key for a URL resolved by a given strategy.
///
/// The suffix keeps results of different strategies on the same URL apart.
pub fn cache_key(url: &str, suffix: &str) -> String {
    format!("{url}{suffix}")
}

/// Hex-encoded SHA-256 digest of a key.
pub fn digest(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Pick one of `buckets` slots for a key, stable across processes.
pub fn bucket(key: &str, buckets: usize) -> usize {
    if buckets <= 1 {
        return 0;
    }
    let hash = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    (u64::from_be_bytes(prefix) % buckets as u64) as usize
}
