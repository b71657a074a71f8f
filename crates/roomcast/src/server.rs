//! `HubServer` builder and accept loop.
//!
//! This is the entry point for running a Roomcast hub. It ties together
//! the layers: transport → protocol → rooms.

use std::sync::Arc;

use roomcast_protocol::JsonCodec;
use roomcast_room::RoomManager;
use roomcast_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RoomcastError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The room
/// manager sits behind a mutex, but the lock is only taken for join and
/// leave — steady-state traffic goes through per-connection room
/// handles and never touches it.
pub(crate) struct HubState {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a hub.
///
/// # Example
///
/// ```rust,ignore
/// use roomcast::prelude::*;
///
/// let server = HubServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct HubServerBuilder {
    bind_addr: String,
}

impl HubServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds the server, binding its listener.
    pub async fn build(self) -> Result<HubServer, RoomcastError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(HubState {
            rooms: Mutex::new(RoomManager::new()),
            codec: JsonCodec,
        });

        Ok(HubServer { transport, state })
    }
}

impl Default for HubServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Roomcast hub.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HubServer {
    transport: WebSocketTransport,
    state: Arc<HubState>,
}

impl HubServer {
    /// Creates a new builder.
    pub fn builder() -> HubServerBuilder {
        HubServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections, performs the join handshake, and
    /// spawns a handler task for each. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        tracing::info!("Roomcast hub running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
