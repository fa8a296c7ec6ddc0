//! Message digest computation.
//!
//! Hashing is a pure transform kept apart from the hardware-bound signer and
//! cipher so it is unit-testable without a store. SHA-256 is the one digest
//! algorithm used for both the signing and hybrid paths.

use sha2::{Digest, Sha256};

/// SHA-256 digest of an arbitrary message.
pub fn sha256(message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(message);
    hasher.finalize().into()
}
