//! Error types for the runtime client.

use roomcast_protocol::ProtocolError;
use roomcast_transport::TransportError;

/// Errors that can occur in the runtime client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No hub endpoint was configured. Connecting without one is a
    /// deployment mistake, not something to paper over with a default.
    #[error("no hub endpoint configured (set SOCKET_URL or RuntimeConfig::endpoint)")]
    EndpointNotConfigured,

    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
