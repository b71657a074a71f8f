//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// message kind this side doesn't know.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A required handshake parameter was absent or empty. The hub
    /// closes the connection without admitting it to any room.
    #[error("missing join parameter: {0}")]
    MissingJoinParam(&'static str),

    /// The message is well-formed but invalid at the protocol level —
    /// e.g. the first message on a connection was not a join.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
