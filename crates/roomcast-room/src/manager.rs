//! Room manager: creates rooms on demand and reaps them when empty.

use std::collections::HashMap;

use roomcast_protocol::{RoomKey, StateMap};
use roomcast_transport::ConnectionId;

use crate::room::spawn_room;
use crate::{PlayerSender, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Manages all active rooms, keyed by `(appId, roomId)`.
///
/// Rooms have no explicit create or destroy API: the first join for a
/// key spawns the room, and the leave that detaches the last
/// connection reaps it. Callers serialize access (the hub keeps the
/// manager behind a mutex), which is what makes the spawn-on-join /
/// reap-on-empty pair race-free: a join can never slip in between "saw
/// zero connections" and "removed the handle".
pub struct RoomManager {
    /// Active rooms. A key is present exactly while at least one
    /// connection is attached to its room.
    rooms: HashMap<RoomKey, RoomHandle>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Adds a connection's player to the room for `key`, creating the
    /// room if this is its first member.
    ///
    /// Returns a handle the caller should keep for the connection's
    /// lifetime — state and event traffic goes through the handle
    /// directly, without coming back to the manager.
    pub async fn join(
        &mut self,
        key: RoomKey,
        conn_id: ConnectionId,
        player_id: String,
        state: StateMap,
        sender: PlayerSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self
            .rooms
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::info!(room = %key, "room created");
                spawn_room(key.clone(), DEFAULT_CHANNEL_SIZE)
            })
            .clone();

        handle.join(conn_id, player_id, state, sender).await?;
        Ok(handle)
    }

    /// Removes a connection's player from the room for `key`, reaping
    /// the room if no connections remain.
    pub async fn leave(
        &mut self,
        key: &RoomKey,
        conn_id: ConnectionId,
        player_id: String,
    ) -> Result<(), RoomError> {
        let Some(handle) = self.rooms.get(key) else {
            // Already reaped; nothing to leave.
            return Ok(());
        };

        let remaining = handle.leave(conn_id, player_id).await?;
        if remaining == 0 {
            if let Some(handle) = self.rooms.remove(key) {
                let _ = handle.shutdown().await;
                tracing::info!(room = %key, "room destroyed");
            }
        }
        Ok(())
    }

    /// Returns the handle for an active room, if any.
    pub fn get(&self, key: &RoomKey) -> Option<RoomHandle> {
        self.rooms.get(key).cloned()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room keys.
    pub fn room_keys(&self) -> Vec<RoomKey> {
        self.rooms.keys().cloned().collect()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
