//! In-memory software key store.
//!
//! Backend of last resort and the test double for the enclave contract. It
//! keeps private scalars inside the store and honors the same policy gating
//! a hardware store would, so callers cannot tell the difference through the
//! trait. Not hardware-backed: capabilities say so.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::SigningKey;
use p256::SecretKey;

use super::{
    AlwaysPresent, KeyPairHandle, KeystoreCaps, PresenceOutcome, SecureKeyStore, UserPresence,
};
use crate::error::{KeyError, Result};
use crate::policy::AccessControlPolicy;
use crate::types::{PublicKey, SharedSecret, Signature};

struct StoredKey {
    signing_key: SigningKey,
    private_policy: AccessControlPolicy,
}

pub struct SoftwareKeyStore {
    keys: Mutex<HashMap<String, StoredKey>>,
    presence: Arc<dyn UserPresence>,
    generations: AtomicUsize,
}

impl SoftwareKeyStore {
    pub fn new() -> Self {
        Self::with_presence(Arc::new(AlwaysPresent))
    }

    /// Build a store with an explicit presence gate, e.g. a scripted gate in
    /// tests exercising the cancelled/failed paths.
    pub fn with_presence(presence: Arc<dyn UserPresence>) -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            presence,
            generations: AtomicUsize::new(0),
        }
    }

    /// Number of generation events since construction. One per label, no
    /// matter how many callers raced on `generate`.
    pub fn generation_count(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    fn lock_keys(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredKey>>> {
        self.keys
            .lock()
            .map_err(|_| KeyError::StoreUnavailable("key store lock poisoned".to_string()))
    }

    /// Clone out the private key and policy for one handle so gated
    /// operations can run without holding the store lock. The presence
    /// prompt blocks with unbounded latency; holding the lock across it
    /// would stall every other store operation, including ungated
    /// `public_key` calls on unrelated labels.
    fn private_key_for(&self, handle: &KeyPairHandle) -> Result<(SigningKey, AccessControlPolicy)> {
        let keys = self.lock_keys()?;
        let stored = keys
            .get(handle.label())
            .ok_or_else(|| KeyError::KeyNotFound(handle.label().to_string()))?;
        Ok((stored.signing_key.clone(), stored.private_policy))
    }

    /// Run the presence gate if the private policy demands it.
    fn check_presence(&self, policy: &AccessControlPolicy, reason: &str) -> Result<()> {
        if !policy.requires_user_presence() {
            return Ok(());
        }
        match self.presence.request_presence(reason) {
            PresenceOutcome::Authenticated => Ok(()),
            PresenceOutcome::Cancelled => Err(KeyError::AuthenticationCancelled),
            PresenceOutcome::Failed => Err(KeyError::AuthenticationFailed),
        }
    }
}

impl Default for SoftwareKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureKeyStore for SoftwareKeyStore {
    fn fetch(&self, label: &str) -> Result<Option<KeyPairHandle>> {
        let keys = self.lock_keys()?;
        Ok(keys.contains_key(label).then(|| KeyPairHandle::new(label)))
    }

    fn generate(
        &self,
        label: &str,
        public_policy: &AccessControlPolicy,
        private_policy: &AccessControlPolicy,
    ) -> Result<KeyPairHandle> {
        if !private_policy.is_at_least_as_restrictive_as(public_policy) {
            return Err(KeyError::InvalidPolicy(
                "private policy must be at least as restrictive as the public policy".to_string(),
            ));
        }

        let mut keys = self.lock_keys()?;
        if keys.contains_key(label) {
            // Create-if-absent: the racing caller gets the existing key.
            return Ok(KeyPairHandle::new(label));
        }

        let signing_key = SigningKey::random(&mut rand::thread_rng());
        keys.insert(
            label.to_string(),
            StoredKey {
                signing_key,
                private_policy: *private_policy,
            },
        );
        self.generations.fetch_add(1, Ordering::SeqCst);
        log::info!("Generated key pair for label: {label}");

        Ok(KeyPairHandle::new(label))
    }

    fn public_key(&self, handle: &KeyPairHandle) -> Result<PublicKey> {
        let keys = self.lock_keys()?;
        let stored = keys
            .get(handle.label())
            .ok_or_else(|| KeyError::KeyNotFound(handle.label().to_string()))?;
        let point = stored.signing_key.verifying_key().to_encoded_point(false);
        PublicKey::from_sec1_bytes(point.as_bytes())
    }

    fn sign_with_handle(&self, handle: &KeyPairHandle, digest: &[u8; 32]) -> Result<Signature> {
        let (signing_key, private_policy) = self.private_key_for(handle)?;

        self.check_presence(&private_policy, "Confirm signing")?;

        let signature: p256::ecdsa::Signature = signing_key
            .sign_prehash(digest)
            .map_err(|e| KeyError::SigningFailed(e.to_string()))?;
        log::debug!("Signed digest with key: {}", handle.label());
        Ok(Signature::from_p256(&signature))
    }

    fn agree_with_handle(&self, handle: &KeyPairHandle, peer: &PublicKey) -> Result<SharedSecret> {
        let (signing_key, private_policy) = self.private_key_for(handle)?;

        self.check_presence(&private_policy, "Confirm decryption")?;

        let peer_key = peer
            .to_p256()
            .map_err(|e| KeyError::KeyAgreementFailed(e.to_string()))?;
        let secret_key = SecretKey::from_bytes(&signing_key.to_bytes())
            .map_err(|e| KeyError::KeyAgreementFailed(e.to_string()))?;
        let shared =
            p256::ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), peer_key.as_affine());

        let bytes: [u8; 32] = shared
            .raw_secret_bytes()
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::KeyAgreementFailed("unexpected secret length".to_string()))?;
        Ok(SharedSecret::new(bytes))
    }

    fn capabilities(&self) -> KeystoreCaps {
        KeystoreCaps {
            hardware_backed: false,
            presence_gate: true,
        }
    }
}
