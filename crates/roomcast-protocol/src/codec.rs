//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust message types and raw bytes. The rest
//! of the runtime doesn't care how messages are serialized — it works
//! against the [`Codec`] trait, so a binary codec can be dropped in
//! later without touching the hub or the client.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust types to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json`.
///
/// JSON keeps messages inspectable in browser DevTools and server
/// logs, which matters more here than wire size: payloads are tiny
/// presence diffs and game events, not bulk data.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
