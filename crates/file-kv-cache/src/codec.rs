//! Entry framing and value serialization
//!
//! An entry file is the decimal expiration timestamp, a line feed, then the
//! serialized payload bytes untouched.

use crate::error::Result;
use crate::types::Miss;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Turns cached values into bytes and back
pub trait PayloadCodec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON payloads via serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Prefix `payload` with its expiration header. `0` means never expires.
pub fn encode_entry(expires_at: i64, payload: &[u8]) -> Vec<u8> {
    let header = expires_at.to_string();
    let mut bytes = Vec::with_capacity(header.len() + 1 + payload.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(payload);
    bytes
}

/// Split an entry file into its expiration and payload
pub fn decode_entry(bytes: &[u8]) -> std::result::Result<(i64, &[u8]), Miss> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(Miss::Malformed)?;
    let (header, rest) = bytes.split_at(newline);

    let expires_at = std::str::from_utf8(header)
        .ok()
        .and_then(|h| h.trim().parse::<i64>().ok())
        .ok_or(Miss::Malformed)?;

    Ok((expires_at, &rest[1..]))
}
