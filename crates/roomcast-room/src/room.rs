//! Room actor: an isolated Tokio task that owns one room's presence.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model" — no shared
//! mutable state, just message passing. Because the actor processes one
//! command at a time, every connection observes the same join / state /
//! event order, with no locking in the broadcast path.

use std::collections::HashMap;

use roomcast_presence::{Player, PresenceRegistry};
use roomcast_protocol::{Json, RoomKey, ServerMessage, StateMap};
use roomcast_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;

/// Channel sender for delivering outbound messages to a connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// Each variant represents an operation the outside world can request.
/// The `oneshot::Sender` in some variants is a "reply channel" — the
/// caller sends a command and waits for the response on that channel.
pub(crate) enum RoomCommand {
    /// Admit a connection and announce its player to the room.
    Join {
        conn_id: ConnectionId,
        player_id: String,
        state: StateMap,
        sender: PlayerSender,
        reply: oneshot::Sender<()>,
    },

    /// Remove a connection's player. Replies with how many connections
    /// remain, so the manager can reap empty rooms.
    Leave {
        conn_id: ConnectionId,
        player_id: String,
        reply: oneshot::Sender<usize>,
    },

    /// Overwrite a player's presence state and rebroadcast it.
    State { player_id: String, state: StateMap },

    /// Relay an application event to everyone in the room.
    Event {
        event: String,
        body: Json,
        player_id: String,
    },

    /// Request a snapshot of everyone currently in the room.
    Snapshot { reply: oneshot::Sender<Vec<Player>> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// This is cheap to clone — it's just an `mpsc::Sender` wrapper.
/// The `RoomManager` holds one per room; connection handlers keep a
/// clone so the steady-state message path never touches the manager.
#[derive(Clone)]
pub struct RoomHandle {
    key: RoomKey,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's key.
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Admits a connection to the room and waits for the join to be
    /// announced.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        player_id: String,
        state: StateMap,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn_id,
                player_id,
                state,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Removes a connection's player from the room. Returns the number
    /// of connections still attached.
    pub async fn leave(
        &self,
        conn_id: ConnectionId,
        player_id: String,
    ) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                conn_id,
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Publishes a player's full presence state (fire-and-forget).
    pub async fn state(
        &self,
        player_id: String,
        state: StateMap,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::State { player_id, state })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Relays an application event to the room (fire-and-forget).
    pub async fn event(
        &self,
        event: String,
        body: Json,
        player_id: String,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event {
                event,
                body,
                player_id,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Requests a snapshot of the room's current players.
    pub async fn snapshot(&self) -> Result<Vec<Player>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    key: RoomKey,
    members: PresenceRegistry,
    /// Per-connection outbound channels.
    senders: HashMap<ConnectionId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room = %self.key, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn_id,
                    player_id,
                    state,
                    sender,
                    reply,
                } => {
                    self.handle_join(conn_id, player_id, state, sender);
                    let _ = reply.send(());
                }
                RoomCommand::Leave {
                    conn_id,
                    player_id,
                    reply,
                } => {
                    let remaining = self.handle_leave(conn_id, &player_id);
                    let _ = reply.send(remaining);
                }
                RoomCommand::State { player_id, state } => {
                    self.handle_state(player_id, state);
                }
                RoomCommand::Event {
                    event,
                    body,
                    player_id,
                } => {
                    self.broadcast(ServerMessage::Event {
                        event,
                        body,
                        player_id,
                    });
                }
                RoomCommand::Snapshot { reply } => {
                    let players =
                        self.members.list().into_iter().cloned().collect();
                    let _ = reply.send(players);
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.key, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room = %self.key, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        player_id: String,
        state: StateMap,
        sender: PlayerSender,
    ) {
        self.senders.insert(conn_id, sender);

        // A returning player keeps the state the room already knows;
        // the incoming state only seeds a player the room has not seen.
        let player = if let Some(existing) = self.members.get(&player_id) {
            existing.clone()
        } else {
            self.members.replace(&player_id, state).clone()
        };

        tracing::info!(
            room = %self.key,
            player_id = %player.id,
            connections = self.senders.len(),
            "player joined"
        );

        // Everyone hears the join, the joiner included — that echo is
        // the client's confirmation that it is in the room.
        self.broadcast(ServerMessage::Join {
            player_id: player.id,
            state: player.state,
        });
    }

    fn handle_leave(
        &mut self,
        conn_id: ConnectionId,
        player_id: &str,
    ) -> usize {
        // Drop the outbound channel first so the departing connection
        // never receives its own leave notice.
        self.senders.remove(&conn_id);

        if self.members.remove(player_id).is_some() {
            tracing::info!(
                room = %self.key,
                %player_id,
                connections = self.senders.len(),
                "player left"
            );
            self.broadcast(ServerMessage::Leave {
                player_id: player_id.to_string(),
            });
        }

        self.senders.len()
    }

    fn handle_state(&mut self, player_id: String, state: StateMap) {
        // Presence updates are only accepted for players the room
        // knows; anything else would fabricate a member that never
        // joined and would never be reaped on disconnect.
        if !self.members.contains(&player_id) {
            tracing::debug!(
                room = %self.key,
                %player_id,
                "state update from non-member, ignoring"
            );
            return;
        }

        let player = self.members.replace(&player_id, state);
        let msg = ServerMessage::State {
            player_id: player.id.clone(),
            state: player.state.clone(),
        };
        self.broadcast(msg);
    }

    /// Sends a message to every attached connection. Silently drops
    /// channels whose receiver is gone (connection tearing down).
    fn broadcast(&self, msg: ServerMessage) {
        for sender in self.senders.values() {
            let _ = sender.send(msg.clone());
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate
/// with it.
///
/// `channel_size` controls backpressure — if the channel fills up,
/// senders will wait (bounded channel).
pub(crate) fn spawn_room(key: RoomKey, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        key: key.clone(),
        members: PresenceRegistry::new(),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { key, sender: tx }
}
