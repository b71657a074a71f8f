//! Unified error type for the Roomcast hub.

use roomcast_kv::KvError;
use roomcast_protocol::ProtocolError;
use roomcast_room::RoomError;
use roomcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roomcast` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (room actor unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A storage-level error (backend unavailable, update conflict).
    #[error(transparent)]
    Kv(#[from] KvError),
}
