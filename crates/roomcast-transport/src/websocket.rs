//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The sink and stream halves of each socket are locked independently:
//! the hub broadcasts into connections from room actors while the
//! owning handler task is parked in `recv`, and a shared lock across
//! both directions would stall every broadcast until a message arrived.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(MaybeTlsStream::Plain(stream))
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let conn = WebSocketConnection::from_stream(ws);
        tracing::debug!(id = %conn.id(), %addr, "accepted WebSocket connection");
        Ok(conn)
    }
}

/// A single WebSocket connection.
///
/// Cheap to clone — clones share the same underlying socket, which is
/// how the hub hands a send handle to its writer task while the
/// handler task keeps receiving.
#[derive(Clone)]
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Arc<Mutex<SplitSink<WsStream, Message>>>,
    stream: Arc<Mutex<SplitStream<WsStream>>>,
}

impl WebSocketConnection {
    fn from_stream(ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id: ConnectionId::new(
                NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            ),
            sink: Arc::new(Mutex::new(sink)),
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    /// Dials a WebSocket endpoint (e.g. `ws://host:port`) and returns
    /// the established connection. This is the client-side counterpart
    /// of [`WebSocketTransport::accept`].
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        let conn = Self::from_stream(ws);
        tracing::debug!(id = %conn.id(), url, "WebSocket connected");
        Ok(conn)
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
