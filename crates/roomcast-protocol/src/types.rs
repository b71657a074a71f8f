//! Core protocol types for Roomcast's wire format.
//!
//! This module defines every type that travels on the wire between a
//! runtime client and the hub. The protocol is deliberately small: a
//! connection announces itself with a `join`, after which exactly four
//! message kinds exist — join, leave, state, and event — matching what
//! the hub broadcasts into a room.

use serde::{Deserialize, Serialize};

use std::fmt;

/// A JSON value. Every state and event payload is one of these; no
/// other type crosses the wire.
pub type Json = serde_json::Value;

/// A player's ephemeral key/value state: a mapping from string keys to
/// [`Json`] values. Keys are unique; insertion order carries no meaning.
pub type StateMap = serde_json::Map<String, Json>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one room: the `(appId, roomId)` pair.
///
/// The app is the tenant scope (one generated game), the room a session
/// within it. `RoomKey` is the hub's map key — two connections land in
/// the same room exactly when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomKey {
    pub app_id: String,
    pub room_id: String,
}

impl RoomKey {
    /// Creates a key from an app id and room id.
    pub fn new(app_id: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            room_id: room_id.into(),
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app:{}:room:{}", self.app_id, self.room_id)
    }
}

/// The handshake triple a connection must announce before it is
/// admitted to a room.
///
/// All three fields are required and must be non-empty. A connection
/// that fails [`validate`](Self::validate) is closed without ever
/// entering a room — no partial membership is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub app_id: String,
    pub room_id: String,
    pub user_id: String,
}

impl JoinParams {
    /// Checks that every handshake parameter is present and non-empty.
    pub fn validate(&self) -> Result<(), crate::ProtocolError> {
        for (name, value) in [
            ("appId", &self.app_id),
            ("roomId", &self.room_id),
            ("userId", &self.user_id),
        ] {
            if value.is_empty() {
                return Err(crate::ProtocolError::MissingJoinParam(name));
            }
        }
        Ok(())
    }

    /// The room this connection is asking to join.
    pub fn room_key(&self) -> RoomKey {
        RoomKey::new(self.app_id.clone(), self.room_id.clone())
    }
}

// ---------------------------------------------------------------------------
// ClientMessage — client → hub
// ---------------------------------------------------------------------------

/// Messages a client sends to the hub.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON, e.g.
/// `{ "type": "state", "playerId": "u1", "state": { ... } }` — the
/// format the browser-side SDK reads and writes.
///
/// `playerId` on `state` and `event` is optional on the wire; the hub
/// resolves it to the sending connection's own id exactly once at the
/// boundary, so downstream code only ever sees an effective sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Announces the connection: which app, which room, who. Must be
    /// the first message on the wire. `state` is the joiner's current
    /// (initially empty) state.
    Join {
        app_id: String,
        room_id: String,
        user_id: String,
        #[serde(default)]
        state: StateMap,
    },

    /// Publishes a player's **full** state (not a diff). The hub
    /// overwrites its record and rebroadcasts to the whole room.
    State {
        #[serde(default)]
        player_id: Option<String>,
        #[serde(default)]
        state: StateMap,
    },

    /// An opaque application event. The hub never interprets `event`
    /// or `body` — it only rebroadcasts them.
    Event {
        event: String,
        body: Json,
        #[serde(default)]
        player_id: Option<String>,
    },
}

impl ClientMessage {
    /// Extracts the handshake triple if this is a `join`.
    pub fn join_params(&self) -> Option<JoinParams> {
        match self {
            Self::Join {
                app_id,
                room_id,
                user_id,
                ..
            } => Some(JoinParams {
                app_id: app_id.clone(),
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage — hub → clients
// ---------------------------------------------------------------------------

/// Messages the hub broadcasts into a room.
///
/// Every broadcast goes to all currently joined members — including
/// the member that caused it. Receivers treat their own join, state,
/// and event messages exactly like remote ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// A player entered the room. `state` is the hub's record for that
    /// id: the previously known state when rejoining, otherwise the
    /// state announced at join.
    Join { player_id: String, state: StateMap },

    /// A player left the room (clean leave or transport drop — the
    /// hub does not distinguish).
    Leave { player_id: String },

    /// A player's full state after an overwrite.
    State { player_id: String, state: StateMap },

    /// An application event, rebroadcast unchanged. `player_id` is the
    /// effective sender resolved by the hub.
    Event {
        event: String,
        body: Json,
        player_id: String,
    },
}

// =========================================================================
// Tests
// =========================================================================
