//! Cache key derivation

use crate::kind::CacheKind;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the kind name and identifier
///
/// The kind is part of the digest input, so the same identifier never maps to
/// the same key under two kinds.
pub fn cache_key(kind: CacheKind, identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(identifier.as_bytes());
    hex::encode(hasher.finalize())
}
