//! Per-connection handler: join handshake, writer task, and routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive the join message → validate the (appId, roomId, userId)
//!      triple
//!   2. Admit the connection to its room (creating the room if needed)
//!   3. Loop: receive state/event messages → forward to the room actor
//!
//! The room broadcasts back through a per-connection channel drained by
//! a separate writer task, so one slow socket never stalls a room.

use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{ClientMessage, Codec, ProtocolError, RoomKey};
use roomcast_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RoomcastError;
use crate::server::HubState;

/// How long a connection may sit silent before its first message.
/// Sockets that never send a join are dropped, not kept around.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that removes a player from their room when the handler
/// exits — clean close, transport error, or panic all look the same to
/// the room.
///
/// Since `Drop` is synchronous, we spawn a fire-and-forget task for the
/// async lock.
struct RoomGuard {
    key: RoomKey,
    conn_id: ConnectionId,
    player_id: String,
    state: Arc<HubState>,
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        let key = self.key.clone();
        let conn_id = self.conn_id;
        let player_id = self.player_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.leave(&key, conn_id, player_id).await {
                tracing::debug!(room = %key, error = %e, "leave failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<HubState>,
) -> Result<(), RoomcastError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Join handshake ---
    let (params, initial_state) = match receive_join(&conn, &state).await {
        Ok(join) => join,
        Err(e) => {
            // The connection never became a room member, so nothing is
            // broadcast — close the socket and walk away.
            let _ = conn.close().await;
            return Err(e);
        }
    };
    let key = params.room_key();
    let user_id = params.user_id;

    tracing::info!(%conn_id, room = %key, %user_id, "player admitted");

    // --- Step 2: Writer task ---
    // The room fans out through this channel; the writer owns the
    // socket's send side for the rest of the connection's life.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let writer_conn = conn.clone();
    let writer_codec = state.codec;
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let bytes = match writer_codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::debug!(error = %e, "encode failed, dropping");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    // --- Step 3: Room admission ---
    // The returned handle carries all further traffic; the manager
    // lock is not touched again until the guard fires.
    let handle = {
        let mut rooms = state.rooms.lock().await;
        rooms
            .join(
                key.clone(),
                conn_id,
                user_id.clone(),
                initial_state,
                out_tx,
            )
            .await?
    };
    let _guard = RoomGuard {
        key: key.clone(),
        conn_id,
        player_id: user_id.clone(),
        state: Arc::clone(&state),
    };

    // --- Step 4: Message loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, %user_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, %user_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                // One bad frame doesn't kill the connection.
                tracing::debug!(%user_id, error = %e, "failed to decode message");
                continue;
            }
        };

        match msg {
            ClientMessage::Join { .. } => {
                tracing::debug!(%user_id, "duplicate join, ignoring");
            }
            ClientMessage::State { player_id, state } => {
                // An omitted playerId means "myself".
                let target = player_id.unwrap_or_else(|| user_id.clone());
                handle.state(target, state).await?;
            }
            ClientMessage::Event {
                event,
                body,
                player_id,
            } => {
                let sender = player_id.unwrap_or_else(|| user_id.clone());
                handle.event(event, body, sender).await?;
            }
        }
    }

    // _guard drops here → room leave fires.
    Ok(())
}

/// Receives and validates the join message that must open every
/// connection.
async fn receive_join(
    conn: &WebSocketConnection,
    state: &Arc<HubState>,
) -> Result<(roomcast_protocol::JoinParams, roomcast_protocol::StateMap), RoomcastError>
{
    let data = match tokio::time::timeout(JOIN_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(RoomcastError::Protocol(ProtocolError::InvalidMessage(
                "connection closed before join".into(),
            )));
        }
        Ok(Err(e)) => return Err(RoomcastError::Transport(e)),
        Err(_) => {
            return Err(RoomcastError::Protocol(ProtocolError::InvalidMessage(
                "join timed out".into(),
            )));
        }
    };

    let msg: ClientMessage = state.codec.decode(&data)?;

    let ClientMessage::Join {
        app_id,
        room_id,
        user_id,
        state: initial_state,
    } = msg
    else {
        return Err(RoomcastError::Protocol(ProtocolError::InvalidMessage(
            "first message must be join".into(),
        )));
    };

    let params = roomcast_protocol::JoinParams {
        app_id,
        room_id,
        user_id,
    };
    params.validate()?;

    Ok((params, initial_state))
}
