use thiserror::Error;

/// Error types for the enclave-keys crate
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid access-control policy: {0}")]
    InvalidPolicy(String),

    #[error("Secure key store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Key generation failed: {0}")]
    GenerationFailed(String),

    #[error("User presence required for this operation")]
    AuthenticationRequired,

    #[error("User presence check cancelled")]
    AuthenticationCancelled,

    #[error("User presence check failed")]
    AuthenticationFailed,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Key agreement failed: {0}")]
    KeyAgreementFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),
}

impl From<hex::FromHexError> for KeyError {
    fn from(err: hex::FromHexError) -> Self {
        KeyError::EncodingError(err.to_string())
    }
}

impl From<base64::DecodeError> for KeyError {
    fn from(err: base64::DecodeError) -> Self {
        KeyError::EncodingError(err.to_string())
    }
}

impl From<hkdf::InvalidLength> for KeyError {
    fn from(err: hkdf::InvalidLength) -> Self {
        KeyError::KeyAgreementFailed(format!("HKDF error: {err}"))
    }
}

/// Result type for enclave-keys operations
pub type Result<T> = std::result::Result<T, KeyError>;
