//! Value types shared across the key lifecycle API.

use crate::codec;
use crate::error::{KeyError, Result};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{EncodePublicKey, LineEnding};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the SEC1 uncompressed point encoding for P-256 (0x04 ‖ X ‖ Y).
pub const PUBLIC_KEY_LENGTH: usize = 65;

/// Marker byte of an uncompressed SEC1 point.
pub const UNCOMPRESSED_POINT_MARKER: u8 = 0x04;

/// AES-GCM authentication tag length.
pub const TAG_LENGTH: usize = 16;

/// A validated P-256 public key in SEC1 uncompressed encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Parse and validate a SEC1-encoded point. Compressed input is accepted
    /// and normalized to the uncompressed form.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let key = p256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("not a valid P-256 point: {e}")))?;
        Ok(Self::from_p256(&key))
    }

    pub(crate) fn from_p256(key: &p256::PublicKey) -> Self {
        Self {
            bytes: key.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    pub(crate) fn to_p256(&self) -> Result<p256::PublicKey> {
        p256::PublicKey::from_sec1_bytes(&self.bytes)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("corrupt public key: {e}")))
    }

    /// Raw SEC1 uncompressed point bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering of the raw point.
    pub fn to_hex(&self) -> String {
        codec::encode_hex(&self.bytes)
    }

    /// Base64 rendering of the raw point.
    pub fn to_base64(&self) -> String {
        codec::encode_base64(&self.bytes)
    }

    /// SPKI DER encoding wrapped as a PEM `PUBLIC KEY` block.
    pub fn to_pem(&self) -> Result<String> {
        self.to_p256()?
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::EncodingError(format!("PEM encoding error: {e}")))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bytes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        PublicKey::from_sec1_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// An ECDSA signature in ASN.1 DER encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    der: Vec<u8>,
}

impl Signature {
    /// Wrap DER signature bytes, validating the encoding.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        p256::ecdsa::Signature::from_der(der)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("bad DER signature: {e}")))?;
        Ok(Self { der: der.to_vec() })
    }

    pub(crate) fn from_p256(sig: &p256::ecdsa::Signature) -> Self {
        Self {
            der: sig.to_der().as_bytes().to_vec(),
        }
    }

    pub(crate) fn to_p256(&self) -> Result<p256::ecdsa::Signature> {
        p256::ecdsa::Signature::from_der(&self.der)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("bad DER signature: {e}")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    pub fn to_hex(&self) -> String {
        codec::encode_hex(&self.der)
    }
}

/// Raw ECDH shared secret. Readable only inside the crate; zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; 32],
}

impl SharedSecret {
    /// Store backends construct this from the raw x-coordinate bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Self-contained hybrid ciphertext: everything a recipient needs besides
/// their own key handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Fresh per-encryption public key; the sender discards its private half.
    pub ephemeral_public_key: PublicKey,
    /// AES-256-GCM ciphertext, tag stripped.
    pub ciphertext: Vec<u8>,
    /// AES-GCM authentication tag.
    pub tag: [u8; TAG_LENGTH],
}

impl EncryptedPayload {
    /// Compact single-blob form for transport through a text buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| KeyError::EncodingError(format!("payload serialization failed: {e}")))
    }

    /// Parse a blob produced by [`EncryptedPayload::to_bytes`]. Malformed
    /// input fails closed as a decryption failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| KeyError::DecryptionFailed(format!("malformed payload: {e}")))
    }
}
