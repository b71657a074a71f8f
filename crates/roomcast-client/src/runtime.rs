//! `AppRuntime`: the full per-app surface — socket plus storage.

use roomcast_kv::{KvBackend, KvStore};

use crate::{ClientError, RuntimeClient, RuntimeConfig};

/// Everything one app instance needs at runtime: the room connection
/// and the two storage scopes.
///
/// - [`kv`](Self::kv) is scoped to this room — match scores, turn
///   order, anything tied to the session.
/// - [`global_kv`](Self::global_kv) is scoped to the whole app and
///   shared across its rooms — leaderboards, lifetime stats.
pub struct AppRuntime<B: KvBackend> {
    socket: RuntimeClient,
    kv: KvStore<B>,
    global_kv: KvStore<B>,
}

impl<B: KvBackend + Clone> AppRuntime<B> {
    /// Connects to the hub and scopes the storage handles.
    pub async fn connect(
        config: &RuntimeConfig,
        backend: B,
        app_id: &str,
        room_id: &str,
        user_id: &str,
    ) -> Result<Self, ClientError> {
        let socket =
            RuntimeClient::connect(config, app_id, room_id, user_id).await?;
        Ok(Self {
            socket,
            kv: KvStore::room_scoped(backend.clone(), app_id, room_id),
            global_kv: KvStore::app_scoped(backend, app_id),
        })
    }
}

impl<B: KvBackend> AppRuntime<B> {
    /// The room connection.
    pub fn socket(&self) -> &RuntimeClient {
        &self.socket
    }

    /// Room-scoped storage.
    pub fn kv(&self) -> &KvStore<B> {
        &self.kv
    }

    /// App-scoped ("global") storage, shared across the app's rooms.
    pub fn global_kv(&self) -> &KvStore<B> {
        &self.global_kv
    }

    /// Disconnects from the hub. Storage handles stay usable on their
    /// own; only the socket is torn down.
    pub async fn close(self) -> Result<(), ClientError> {
        self.socket.close().await
    }
}
