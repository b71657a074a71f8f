//! Error types for the room layer.

use roomcast_protocol::RoomKey;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomKey),
}
