//! Error types for the key-value layer.

/// Errors that can occur in the key-value layer.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The backend address is missing — e.g. `REDIS_URL` is not set.
    /// Fatal at construction; never retried.
    #[error("kv backend is not configured: {0}")]
    NotConfigured(String),

    /// The backend could not be reached or an operation on it failed
    /// or timed out.
    #[error("kv backend unavailable: {0}")]
    Unavailable(String),

    /// Serializing a value to its stored form failed. Rejected before
    /// any network call is made.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A stored value could not be parsed back into the requested type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// `update` saw a conflicting writer on every attempt and gave up.
    /// The stored value reflects some writer's complete update — never
    /// a partial or merged write — but not this caller's. Callers must
    /// handle this explicitly (e.g. re-fetch and re-issue).
    #[error("update of key {key:?} failed after {attempts} conflicting attempts")]
    ConflictExhausted { key: String, attempts: u32 },
}
