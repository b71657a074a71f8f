//! Player presence for Roomcast.
//!
//! A [`PresenceRegistry`] is the set of players one endpoint currently
//! knows about: the hub keeps one per room (the authoritative
//! membership), and every runtime client keeps one as its local mirror
//! of the hub's broadcasts.
//!
//! # Concurrency note
//!
//! The registry is NOT thread-safe by itself — it uses a plain
//! `HashMap`. This is intentional: each registry is owned by a single
//! task (a room actor) or guarded by a lock at a higher level (the
//! client's shared state). Keeping it simple here avoids hidden
//! locking overhead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use roomcast_protocol::StateMap;

/// A connected participant: an identity plus ephemeral key/value state.
///
/// Players exist only while a connection for their id is open in the
/// registry holding them. State that must survive reconnects belongs
/// in the KV store, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub state: StateMap,
}

impl Player {
    /// Creates a player with empty state.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: StateMap::new(),
        }
    }

    /// Merges `partial` into this player's state key-by-key: new keys
    /// are added, existing keys overwritten, keys absent from
    /// `partial` are left untouched.
    pub fn merge_state(&mut self, partial: StateMap) {
        for (key, value) in partial {
            self.state.insert(key, value);
        }
    }
}

/// The set of currently known players for one endpoint.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    players: HashMap<String, Player>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or merges a player.
    ///
    /// If `id` is unknown, creates a player with exactly `partial` as
    /// its state. If known, merges `partial` into the existing state
    /// (see [`Player::merge_state`]). Returns the resulting player.
    pub fn upsert(&mut self, id: &str, partial: StateMap) -> &Player {
        let player = self
            .players
            .entry(id.to_string())
            .or_insert_with(|| Player::new(id));
        player.merge_state(partial);
        player
    }

    /// Inserts or fully overwrites a player's state.
    ///
    /// This is the hub's semantics for a `state` message: the wire
    /// carries the complete state, so keys missing from `state` are
    /// dropped rather than retained.
    pub fn replace(&mut self, id: &str, state: StateMap) -> &Player {
        let player = self
            .players
            .entry(id.to_string())
            .or_insert_with(|| Player::new(id));
        player.state = state;
        player
    }

    /// Detaches and returns the player if present; no-op otherwise.
    pub fn remove(&mut self, id: &str) -> Option<Player> {
        self.players.remove(id)
    }

    /// Returns the player with the given id, if known.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Returns `true` if a player with the given id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// Enumerates the current players. Order is unspecified.
    pub fn list(&self) -> Vec<&Player> {
        self.players.values().collect()
    }

    /// The number of current players.
    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if no players are registered.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
