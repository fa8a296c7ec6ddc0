//! Enclave Keys – public API facade
//!
//! Lifecycle management for a hardware-backed asymmetric key pair: lazy
//! labelled acquisition under access-control policies, digest signing, and
//! hybrid ECDH + HKDF + AES-GCM encryption. Private key material never
//! leaves the secure store; everything here operates on opaque handles.

pub mod codec;
pub mod digest;
pub mod error;
pub mod hybrid;
pub mod keystore;
pub mod manager;
pub mod policy;
pub mod signer;
pub mod types;

pub use error::{KeyError, Result};

pub use policy::{AccessControlPolicy, Protection};

pub use keystore::{
    software::SoftwareKeyStore, AlwaysPresent, KeyPairHandle, KeystoreCaps, PresenceOutcome,
    SecureKeyStore, UserPresence,
};

pub use manager::{KeyConfig, KeyManager};

pub use signer::{verify, Signer};

pub use hybrid::HybridCipher;

pub use types::{EncryptedPayload, PublicKey, SharedSecret, Signature};
