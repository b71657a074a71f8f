//! Wire protocol for the Roomcast realtime runtime.
//!
//! Defines the messages a runtime client and the hub exchange over a
//! room connection, plus the codec that puts them on the wire.
//!
//! # Key types
//!
//! - [`ClientMessage`] / [`ServerMessage`] — the four message kinds
//!   (join, leave, state, event)
//! - [`JoinParams`] — the `(appId, roomId, userId)` handshake triple
//! - [`RoomKey`] — identifies one room within one app
//! - [`Codec`] / [`JsonCodec`] — byte-level encoding

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientMessage, JoinParams, Json, RoomKey, ServerMessage, StateMap};
