//! Room lifecycle management for Roomcast.
//!
//! Each room runs as an isolated Tokio task (actor model) owning that
//! room's presence and broadcast fan-out. Rooms come into existence
//! when their first member joins and disappear when their last
//! connection detaches.
//!
//! # Key types
//!
//! - [`RoomManager`] — spawns rooms on first join, reaps empty ones
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`PlayerSender`] — per-connection outbound channel for broadcasts

mod error;
mod manager;
mod room;

pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle};
