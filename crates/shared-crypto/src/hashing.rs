//! # Keccak-256 Hashing
//!
//! One-shot and incremental Keccak-256, the hash underlying signer
//! identities and domain-separated payload digests.

use sha3::{Digest, Keccak256};
use shared_types::Hash;

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Stateful Keccak-256 hasher for multi-field digests.
#[derive(Default)]
pub struct Keccak256Hasher {
    inner: Keccak256,
}

impl Keccak256Hasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            inner: Keccak256::new(),
        }
    }

    /// Absorb data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Hash {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.inner.finalize());
        hash
    }
}
