//! Hybrid (ECIES-style) encryption for an enclave-held recipient key.
//!
//! Enclave private keys support signing and key agreement but not direct
//! asymmetric decryption, so encryption is hybrid: a fresh software-side
//! ephemeral P-256 pair runs ECDH against the recipient's public key, the
//! shared secret is expanded through HKDF-SHA256 into an AES-256-GCM key and
//! nonce, and the ephemeral public key travels with the ciphertext. Binding
//! the ephemeral point into the HKDF info string ties each key/nonce to one
//! encryption, so the derived nonce is never reused.

use std::sync::Arc;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use p256::ecdh::EphemeralSecret;
use sha2::Sha256;

use crate::error::{KeyError, Result};
use crate::keystore::{KeyPairHandle, SecureKeyStore};
use crate::types::{EncryptedPayload, PublicKey, SharedSecret, TAG_LENGTH};

const SYMMETRIC_KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const KDF_CONTEXT: &[u8] = b"enclave-keys hybrid v1";

pub struct HybridCipher {
    store: Arc<dyn SecureKeyStore>,
}

impl HybridCipher {
    pub fn new(store: Arc<dyn SecureKeyStore>) -> Self {
        Self { store }
    }

    /// Encrypt `plaintext` so only the holder of `recipient`'s private key
    /// can read it. Each call draws a fresh ephemeral key pair; two
    /// encryptions of the same plaintext never produce the same payload.
    pub fn encrypt(&self, recipient: &PublicKey, plaintext: &[u8]) -> Result<EncryptedPayload> {
        let recipient_key = recipient.to_p256()?;

        let ephemeral_secret = EphemeralSecret::random(&mut rand::thread_rng());
        let ephemeral_public = PublicKey::from_p256(&ephemeral_secret.public_key());

        let shared = ephemeral_secret.diffie_hellman(&recipient_key);
        let shared_bytes: [u8; 32] = shared
            .raw_secret_bytes()
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::KeyAgreementFailed("unexpected secret length".to_string()))?;
        let shared = SharedSecret::new(shared_bytes);

        let (key, nonce) = derive_key_and_nonce(&shared, &ephemeral_public)?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| KeyError::KeyAgreementFailed(format!("cipher setup failed: {e}")))?;
        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| KeyError::KeyAgreementFailed(format!("encryption failed: {e}")))?;

        // AES-GCM appends the tag; carry it as a separate field.
        let tag_offset = sealed.len() - TAG_LENGTH;
        let tag: [u8; TAG_LENGTH] = sealed[tag_offset..]
            .try_into()
            .map_err(|_| KeyError::KeyAgreementFailed("truncated cipher output".to_string()))?;
        sealed.truncate(tag_offset);

        log::debug!("Encrypted {} plaintext bytes", plaintext.len());

        Ok(EncryptedPayload {
            ephemeral_public_key: ephemeral_public,
            ciphertext: sealed,
            tag,
        })
    }

    /// Decrypt a payload with the store-held private key behind `handle`.
    /// Runs the store's key agreement (presence-gated when the private
    /// policy demands it), then decrypts and verifies the tag. Fails closed:
    /// a tag mismatch yields `DecryptionFailed` and no plaintext.
    pub fn decrypt(&self, handle: &KeyPairHandle, payload: &EncryptedPayload) -> Result<Vec<u8>> {
        let shared = self
            .store
            .agree_with_handle(handle, &payload.ephemeral_public_key)?;

        let (key, nonce) = derive_key_and_nonce(&shared, &payload.ephemeral_public_key)?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| KeyError::DecryptionFailed(format!("cipher setup failed: {e}")))?;

        let mut sealed = Vec::with_capacity(payload.ciphertext.len() + TAG_LENGTH);
        sealed.extend_from_slice(&payload.ciphertext);
        sealed.extend_from_slice(&payload.tag);

        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| {
                KeyError::DecryptionFailed("authentication tag mismatch".to_string())
            })?;

        log::debug!("Decrypted {} ciphertext bytes", payload.ciphertext.len());
        Ok(plaintext)
    }
}

/// Expand the ECDH secret into a symmetric key and nonce, bound to the
/// ephemeral public key of this encryption.
fn derive_key_and_nonce(
    shared: &SharedSecret,
    ephemeral_public: &PublicKey,
) -> Result<([u8; SYMMETRIC_KEY_LENGTH], [u8; NONCE_LENGTH])> {
    let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());

    let mut info = Vec::with_capacity(KDF_CONTEXT.len() + ephemeral_public.as_bytes().len());
    info.extend_from_slice(KDF_CONTEXT);
    info.extend_from_slice(ephemeral_public.as_bytes());

    let mut okm = [0u8; SYMMETRIC_KEY_LENGTH + NONCE_LENGTH];
    hk.expand(&info, &mut okm)?;

    let mut key = [0u8; SYMMETRIC_KEY_LENGTH];
    key.copy_from_slice(&okm[..SYMMETRIC_KEY_LENGTH]);
    let mut nonce = [0u8; NONCE_LENGTH];
    nonce.copy_from_slice(&okm[SYMMETRIC_KEY_LENGTH..]);

    Ok((key, nonce))
}
