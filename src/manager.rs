//! Key pair lifecycle management.
//!
//! `KeyManager` owns one named key pair inside a secure store: it lazily
//! creates or fetches the handle, memoizes it for the process lifetime, and
//! exposes the public key. The store and configuration are injected at
//! construction; there is no global singleton.

use std::sync::{Arc, Mutex};

use crate::error::{KeyError, Result};
use crate::keystore::{KeyPairHandle, SecureKeyStore};
use crate::policy::AccessControlPolicy;
use crate::types::PublicKey;

/// Label and policy pair for one managed key.
#[derive(Debug, Clone)]
pub struct KeyConfig {
    label: String,
    public_policy: AccessControlPolicy,
    private_policy: AccessControlPolicy,
}

impl KeyConfig {
    /// Validates that the private policy is at least as restrictive as the
    /// public one; a laxer private half would defeat the gating.
    pub fn new(
        label: impl Into<String>,
        public_policy: AccessControlPolicy,
        private_policy: AccessControlPolicy,
    ) -> Result<Self> {
        if !private_policy.is_at_least_as_restrictive_as(&public_policy) {
            return Err(KeyError::InvalidPolicy(
                "private policy must be at least as restrictive as the public policy".to_string(),
            ));
        }
        Ok(Self {
            label: label.into(),
            public_policy,
            private_policy,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

pub struct KeyManager {
    store: Arc<dyn SecureKeyStore>,
    config: KeyConfig,
    // Memoized handle. The lock is held across the store round trip so that
    // concurrent first-time callers admit at most one generation attempt.
    handle: Mutex<Option<KeyPairHandle>>,
}

impl KeyManager {
    pub fn new(store: Arc<dyn SecureKeyStore>, config: KeyConfig) -> Self {
        Self {
            store,
            config,
            handle: Mutex::new(None),
        }
    }

    /// Fetch the managed key pair, generating it on first use. Idempotent:
    /// every call returns a handle to the same stored key.
    pub fn get_or_create_key_pair(&self) -> Result<KeyPairHandle> {
        let mut cached = self
            .handle
            .lock()
            .map_err(|_| KeyError::StoreUnavailable("handle cache lock poisoned".to_string()))?;

        if let Some(handle) = cached.as_ref() {
            return Ok(handle.clone());
        }

        let handle = match self.store.fetch(self.config.label())? {
            Some(handle) => {
                log::debug!("Fetched existing key pair: {}", self.config.label());
                handle
            }
            None => {
                let handle = self.store.generate(
                    self.config.label(),
                    &self.config.public_policy,
                    &self.config.private_policy,
                )?;
                log::info!("Key pair created for label: {}", self.config.label());
                handle
            }
        };

        *cached = Some(handle.clone());
        Ok(handle)
    }

    /// Derive the public key for a handle. Never requires user presence:
    /// public material carries no confidentiality requirement.
    pub fn public_key(&self, handle: &KeyPairHandle) -> Result<PublicKey> {
        self.store.public_key(handle)
    }
}
