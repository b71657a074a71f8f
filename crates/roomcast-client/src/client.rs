//! The runtime client: a hub connection plus a local presence mirror.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use roomcast_presence::{Player, PresenceRegistry};
use roomcast_protocol::{
    ClientMessage, Codec, Json, JsonCodec, ServerMessage, StateMap,
};
use roomcast_transport::{Connection, WebSocketConnection};
use tokio::task::JoinHandle;

use crate::{ClientError, RuntimeConfig};

type EventHandler = Arc<dyn Fn(&Json, &Player) + Send + Sync>;
type PresenceHandler = Arc<dyn Fn(&Player) + Send + Sync>;

/// State shared between the client API and its reader task.
struct Shared {
    presence: PresenceRegistry,
    event_handlers: HashMap<String, Vec<EventHandler>>,
    join_handlers: Vec<PresenceHandler>,
    leave_handlers: Vec<PresenceHandler>,
}

/// A live connection to one room on a hub.
///
/// The client keeps a local mirror of the room's presence, fed by the
/// hub's broadcasts, and exposes callback registration for joins,
/// leaves, and application events. All callbacks run on the client's
/// reader task; keep them quick and hand heavy work to a channel.
///
/// # Example
///
/// ```rust,ignore
/// let config = RuntimeConfig::from_env();
/// let client = RuntimeClient::connect(&config, "app1", "r1", "u1").await?;
/// client.on_join(|p| println!("{} joined", p.id));
/// client.broadcast("chat", serde_json::json!({ "text": "hi" })).await?;
/// ```
pub struct RuntimeClient {
    conn: WebSocketConnection,
    codec: JsonCodec,
    user_id: String,
    shared: Arc<Mutex<Shared>>,
    reader: JoinHandle<()>,
}

impl RuntimeClient {
    /// Connects to the hub and joins the given room.
    ///
    /// The local player is registered in the mirror before the join is
    /// even sent, so [`players`](Self::players) always includes
    /// yourself — the hub's join echo then merges cleanly into that
    /// record instead of re-announcing it.
    pub async fn connect(
        config: &RuntimeConfig,
        app_id: &str,
        room_id: &str,
        user_id: &str,
    ) -> Result<Self, ClientError> {
        let endpoint = config.resolve_endpoint()?;
        let conn = WebSocketConnection::connect(endpoint).await?;
        let codec = JsonCodec;

        let mut presence = PresenceRegistry::new();
        presence.replace(user_id, StateMap::new());
        let shared = Arc::new(Mutex::new(Shared {
            presence,
            event_handlers: HashMap::new(),
            join_handlers: Vec::new(),
            leave_handlers: Vec::new(),
        }));

        let join = ClientMessage::Join {
            app_id: app_id.to_string(),
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            state: StateMap::new(),
        };
        conn.send(&codec.encode(&join)?).await?;

        let reader = tokio::spawn(run_reader(
            conn.clone(),
            codec,
            user_id.to_string(),
            Arc::clone(&shared),
        ));

        tracing::debug!(%app_id, %room_id, %user_id, "runtime client connected");

        Ok(Self {
            conn,
            codec,
            user_id: user_id.to_string(),
            shared,
            reader,
        })
    }

    /// This client's own player id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Registers a callback for a named application event.
    ///
    /// Fires for every copy the hub delivers — your own broadcasts
    /// included, since the hub echoes them back.
    pub fn on(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&Json, &Player) + Send + Sync + 'static,
    ) {
        self.lock()
            .event_handlers
            .entry(event.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Registers a callback for players entering the room.
    ///
    /// Does not fire for this client's own join — you already know.
    pub fn on_join(&self, handler: impl Fn(&Player) + Send + Sync + 'static) {
        self.lock().join_handlers.push(Arc::new(handler));
    }

    /// Registers a callback for players leaving the room.
    pub fn on_leave(&self, handler: impl Fn(&Player) + Send + Sync + 'static) {
        self.lock().leave_handlers.push(Arc::new(handler));
    }

    /// Broadcasts an application event to the room (self included).
    pub async fn broadcast(
        &self,
        event: impl Into<String>,
        body: Json,
    ) -> Result<(), ClientError> {
        let msg = ClientMessage::Event {
            event: event.into(),
            body,
            player_id: None,
        };
        self.conn.send(&self.codec.encode(&msg)?).await?;
        Ok(())
    }

    /// Merges `partial` into this player's state and publishes the
    /// result.
    ///
    /// The wire carries the **full** state after the merge, so the hub
    /// and every peer converge on the same record even if they missed
    /// earlier updates.
    pub async fn set_state(&self, partial: StateMap) -> Result<(), ClientError> {
        let full = {
            let mut shared = self.lock();
            shared.presence.upsert(&self.user_id, partial).state.clone()
        };

        let msg = ClientMessage::State {
            player_id: Some(self.user_id.clone()),
            state: full,
        };
        self.conn.send(&self.codec.encode(&msg)?).await?;
        Ok(())
    }

    /// A snapshot of everyone this client currently knows about.
    pub fn players(&self) -> Vec<Player> {
        self.lock().presence.list().into_iter().cloned().collect()
    }

    /// A snapshot of one player, if known.
    pub fn player(&self, id: &str) -> Option<Player> {
        self.lock().presence.get(id).cloned()
    }

    /// The number of players this client currently knows about.
    pub fn player_count(&self) -> usize {
        self.lock().presence.count()
    }

    /// Closes the connection. The hub announces the leave to the rest
    /// of the room.
    pub async fn close(self) -> Result<(), ClientError> {
        self.conn.close().await?;
        self.reader.abort();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A handler that panicked poisons the lock; the mirror itself
        // is still consistent, so keep going.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drains hub broadcasts into the shared mirror and fires callbacks.
async fn run_reader(
    conn: WebSocketConnection,
    codec: JsonCodec,
    own_id: String,
    shared: Arc<Mutex<Shared>>,
) {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(user_id = %own_id, "hub closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!(user_id = %own_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ServerMessage = match codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable broadcast, skipping");
                continue;
            }
        };

        apply(&own_id, &shared, msg);
    }
}

/// Applies one broadcast to the mirror.
///
/// Handlers are cloned out before the lock is released and invoked
/// after, so a handler calling back into the client can't deadlock.
fn apply(own_id: &str, shared: &Mutex<Shared>, msg: ServerMessage) {
    fn guard(s: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
        s.lock().unwrap_or_else(PoisonError::into_inner)
    }

    match msg {
        ServerMessage::Join { player_id, state } => {
            let (player, handlers) = {
                let mut shared = guard(shared);
                let player = shared.presence.upsert(&player_id, state).clone();
                // The echo of our own join is just a confirmation.
                let handlers = if player_id == own_id {
                    Vec::new()
                } else {
                    shared.join_handlers.clone()
                };
                (player, handlers)
            };
            for handler in handlers {
                handler(&player);
            }
        }

        ServerMessage::Leave { player_id } => {
            let (removed, handlers) = {
                let mut shared = guard(shared);
                let removed = shared.presence.remove(&player_id);
                (removed, shared.leave_handlers.clone())
            };
            if let Some(player) = removed {
                for handler in handlers {
                    handler(&player);
                }
            }
        }

        ServerMessage::State { player_id, state } => {
            let mut shared = guard(shared);
            shared.presence.upsert(&player_id, state);
        }

        ServerMessage::Event {
            event,
            body,
            player_id,
        } => {
            let (player, handlers) = {
                let shared = guard(shared);
                // Events may name a player the mirror doesn't track
                // (an NPC, say) — hand the handler a transient record
                // rather than polluting the mirror.
                let player = shared
                    .presence
                    .get(&player_id)
                    .cloned()
                    .unwrap_or_else(|| Player::new(player_id.clone()));
                let handlers = shared
                    .event_handlers
                    .get(&event)
                    .cloned()
                    .unwrap_or_default();
                (player, handlers)
            };
            for handler in handlers {
                handler(&body, &player);
            }
        }
    }
}
