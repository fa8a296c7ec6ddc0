//! Digest signing with a store-held private key.

use std::sync::Arc;

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::VerifyingKey;

use crate::error::{KeyError, Result};
use crate::keystore::{KeyPairHandle, SecureKeyStore};
use crate::types::{PublicKey, Signature};

/// Signs pre-computed digests by reference to a key handle. Hashing happens
/// in [`crate::digest`]; this component never sees raw private key bytes.
pub struct Signer {
    store: Arc<dyn SecureKeyStore>,
}

impl Signer {
    pub fn new(store: Arc<dyn SecureKeyStore>) -> Self {
        Self { store }
    }

    /// ECDSA-sign a 32-byte digest. May block on a user-presence prompt if
    /// the key's private policy requires one.
    pub fn sign(&self, handle: &KeyPairHandle, digest: &[u8; 32]) -> Result<Signature> {
        self.store.sign_with_handle(handle, digest)
    }
}

/// Software-side verification of a signature against a public key and the
/// digest it was produced over.
pub fn verify(public_key: &PublicKey, digest: &[u8; 32], signature: &Signature) -> Result<bool> {
    let verifying_key = VerifyingKey::from_sec1_bytes(public_key.as_bytes())
        .map_err(|e| KeyError::InvalidKeyFormat(format!("bad verifying key: {e}")))?;
    Ok(verifying_key
        .verify_prehash(digest, &signature.to_p256()?)
        .is_ok())
}
