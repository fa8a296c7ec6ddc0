//! Secure key store abstraction.
//!
//! The store owns all private key material; the rest of the crate only ever
//! holds opaque handles and asks the store to sign or run key agreement by
//! reference. Backends:
//! - [`software::SoftwareKeyStore`], an in-memory P-256 store used by tests
//!   and as the fallback where no enclave is present.

use crate::error::Result;
use crate::policy::AccessControlPolicy;
use crate::types::{PublicKey, SharedSecret, Signature};

pub mod software;

/// Opaque reference to a hardware-resident key pair, identified by its
/// stable label. Issued by a store; exposes no key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairHandle {
    label: String,
}

impl KeyPairHandle {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Capabilities reported by a store backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeystoreCaps {
    /// True when private keys live in a secure enclave / TEE.
    pub hardware_backed: bool,
    /// True when the backend can run a user-presence check.
    pub presence_gate: bool,
}

/// Outcome of a blocking user-presence prompt.
///
/// The prompt is a suspension point with exactly three results; it never
/// escapes as a panic or a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceOutcome {
    Authenticated,
    Cancelled,
    Failed,
}

/// Host-side user-presence check (biometric or passcode prompt). The call
/// blocks until the user responds; latency is unbounded.
pub trait UserPresence: Send + Sync {
    fn request_presence(&self, reason: &str) -> PresenceOutcome;
}

/// Presence gate that approves every request. Default for stores without a
/// prompt surface.
#[derive(Debug, Default)]
pub struct AlwaysPresent;

impl UserPresence for AlwaysPresent {
    fn request_presence(&self, _reason: &str) -> PresenceOutcome {
        PresenceOutcome::Authenticated
    }
}

/// Contract the core consumes from the hardware-backed key store.
///
/// `generate` is atomic create-if-absent: concurrent calls for one label
/// converge on a single stored key. Private-policy enforcement (including
/// the presence gate) happens inside `sign_with_handle` and
/// `agree_with_handle`; `public_key` is never gated.
pub trait SecureKeyStore: Send + Sync {
    /// Look up an existing key pair by label.
    fn fetch(&self, label: &str) -> Result<Option<KeyPairHandle>>;

    /// Create a key pair under the given policies, or return the existing
    /// handle if the label is already present.
    fn generate(
        &self,
        label: &str,
        public_policy: &AccessControlPolicy,
        private_policy: &AccessControlPolicy,
    ) -> Result<KeyPairHandle>;

    /// Derive the public key for a handle. No authentication required.
    fn public_key(&self, handle: &KeyPairHandle) -> Result<PublicKey>;

    /// ECDSA-sign a pre-computed digest with the handle's private key.
    fn sign_with_handle(&self, handle: &KeyPairHandle, digest: &[u8; 32]) -> Result<Signature>;

    /// ECDH between the handle's private key and a peer public key.
    fn agree_with_handle(&self, handle: &KeyPairHandle, peer: &PublicKey) -> Result<SharedSecret>;

    fn capabilities(&self) -> KeystoreCaps;
}
