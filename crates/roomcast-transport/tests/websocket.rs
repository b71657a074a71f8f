//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and dial it with
//! [`WebSocketConnection::connect`], verifying that bytes actually
//! flow both ways and that close is observed as `Ok(None)`.

#[cfg(feature = "websocket")]
mod websocket {
    use roomcast_transport::{
        Connection, Transport, WebSocketConnection, WebSocketTransport,
    };

    /// Binds a transport on a random port and returns it with the
    /// address a client can dial.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn test_send_and_receive_both_directions() {
        let (mut transport, url) = bind().await;

        let server = tokio::spawn(async move {
            let conn = transport.accept().await.expect("accept");
            let got = conn.recv().await.expect("recv").expect("some");
            assert_eq!(got, b"hello from client");
            conn.send(b"hello from server").await.expect("send");
        });

        let client = WebSocketConnection::connect(&url)
            .await
            .expect("connect");
        client.send(b"hello from client").await.expect("send");
        let got = client.recv().await.expect("recv").expect("some");
        assert_eq!(got, b"hello from server");

        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_close_is_observed_as_none() {
        let (mut transport, url) = bind().await;

        let server = tokio::spawn(async move {
            let conn = transport.accept().await.expect("accept");
            assert!(conn.recv().await.expect("recv").is_none());
        });

        let client = WebSocketConnection::connect(&url)
            .await
            .expect("connect");
        client.close().await.expect("close");

        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_clones_share_the_same_socket() {
        let (mut transport, url) = bind().await;

        let server = tokio::spawn(async move {
            let conn = transport.accept().await.expect("accept");
            // Send through a clone while the original is parked in recv.
            let writer = conn.clone();
            writer.send(b"from clone").await.expect("send");
            let got = conn.recv().await.expect("recv").expect("some");
            assert_eq!(got, b"ack");
        });

        let client = WebSocketConnection::connect(&url)
            .await
            .expect("connect");
        let got = client.recv().await.expect("recv").expect("some");
        assert_eq!(got, b"from clone");
        client.send(b"ack").await.expect("send");

        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (mut transport, url) = bind().await;

        let server = tokio::spawn(async move {
            let a = transport.accept().await.expect("accept");
            let b = transport.accept().await.expect("accept");
            assert_ne!(a.id(), b.id());
        });

        let _c1 = WebSocketConnection::connect(&url).await.expect("connect");
        let _c2 = WebSocketConnection::connect(&url).await.expect("connect");

        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_connect_to_unbound_port_fails() {
        // Port 1 is never listening.
        let result = WebSocketConnection::connect("ws://127.0.0.1:1").await;
        assert!(result.is_err());
    }
}
