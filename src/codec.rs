//! Byte/text codec used at the boundary with the presentation layer.
//!
//! Strict round-trip behavior only: hex decoding accepts mixed case but
//! rejects odd-length input and non-hex characters; base64 uses the standard
//! alphabet with padding.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(text)?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}
