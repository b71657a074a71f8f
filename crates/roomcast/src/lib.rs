//! # Roomcast
//!
//! Realtime presence and event hub for multiplayer web games.
//!
//! A Roomcast hub holds rooms keyed by `(appId, roomId)`. Clients join
//! a room over WebSocket, publish ephemeral per-player state, and relay
//! opaque application events; the hub broadcasts everything to the
//! whole room, sender included. Durable data goes through the
//! namespaced key-value store instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RoomcastError> {
//!     let server = HubServer::builder().bind("0.0.0.0:8080").build().await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::RoomcastError;
pub use server::{HubServer, HubServerBuilder};

// Re-export the sub-crates so applications depend on one crate.
pub use roomcast_kv as kv;
pub use roomcast_presence as presence;
pub use roomcast_protocol as protocol;
pub use roomcast_room as room;
pub use roomcast_transport as transport;

/// The types most applications need, in one import.
pub mod prelude {
    pub use crate::error::RoomcastError;
    pub use crate::server::{HubServer, HubServerBuilder};

    pub use roomcast_kv::{KvBackend, KvError, KvStore, MemoryBackend};
    pub use roomcast_presence::{Player, PresenceRegistry};
    pub use roomcast_protocol::{
        ClientMessage, Codec, Json, JsonCodec, RoomKey, ServerMessage,
        StateMap,
    };
    pub use roomcast_room::{RoomError, RoomHandle, RoomManager};
    pub use roomcast_transport::{Connection, ConnectionId, Transport};
}
