//! Integration tests for the hub: full connection flow over real
//! WebSockets, speaking the raw JSON wire format a browser SDK would.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roomcast::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a hub on a random port and returns the address.
async fn start_hub() -> String {
    let server = HubServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("hub should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Sends a JSON message as a text frame, the way browser clients do.
async fn send_json(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

/// Receives the next data frame and parses it as JSON.
async fn recv_json(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("recv");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("json");
            }
            Message::Binary(data) => {
                return serde_json::from_slice(&data).expect("json");
            }
            // Control frames are transparent to the protocol.
            _ => continue,
        }
    }
}

/// Asserts that nothing arrives on this socket for a little while.
async fn assert_silent(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

/// Asserts the server has closed (or is closing) this socket.
async fn assert_closed(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

/// Connects, joins the given room, and consumes the join echo.
async fn join(addr: &str, room: &str, user: &str) -> ClientWs {
    let mut ws = connect(addr).await;
    send_json(
        &mut ws,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": room,
            "userId": user,
            "state": {},
        }),
    )
    .await;

    let echo = recv_json(&mut ws).await;
    assert_eq!(echo["type"], "join");
    assert_eq!(echo["playerId"], user);
    ws
}

// =========================================================================
// Join handshake
// =========================================================================

#[tokio::test]
async fn test_join_echoes_back_to_the_joiner() {
    let addr = start_hub().await;
    let mut ws = connect(&addr).await;

    send_json(
        &mut ws,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": "r1",
            "userId": "u1",
            "state": { "ready": false },
        }),
    )
    .await;

    let echo = recv_json(&mut ws).await;
    assert_eq!(echo["type"], "join");
    assert_eq!(echo["playerId"], "u1");
    assert_eq!(echo["state"]["ready"], false);
}

#[tokio::test]
async fn test_join_is_broadcast_to_existing_members() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;

    let _ws2 = join(&addr, "r1", "u2").await;

    let seen = recv_json(&mut ws1).await;
    assert_eq!(seen["type"], "join");
    assert_eq!(seen["playerId"], "u2");
}

#[tokio::test]
async fn test_join_with_missing_user_id_closes_without_broadcast() {
    let addr = start_hub().await;
    let mut member = join(&addr, "r1", "u1").await;

    let mut ws = connect(&addr).await;
    send_json(
        &mut ws,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": "r1",
            "userId": "",
        }),
    )
    .await;

    assert_closed(&mut ws).await;
    // The rejected connection never became a member.
    assert_silent(&mut member).await;
}

#[tokio::test]
async fn test_first_message_must_be_join() {
    let addr = start_hub().await;
    let mut ws = connect(&addr).await;

    send_json(
        &mut ws,
        json!({ "type": "event", "event": "e", "body": null }),
    )
    .await;

    assert_closed(&mut ws).await;
}

#[tokio::test]
async fn test_duplicate_join_is_ignored() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;
    let mut ws2 = join(&addr, "r1", "u2").await;
    let _ = recv_json(&mut ws1).await; // u2's join

    // A second join on a live connection must not re-announce.
    send_json(
        &mut ws2,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": "r1",
            "userId": "u2",
            "state": {},
        }),
    )
    .await;

    assert_silent(&mut ws1).await;
}

// =========================================================================
// Events
// =========================================================================

#[tokio::test]
async fn test_event_fans_out_to_everyone_including_sender() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;
    let mut ws2 = join(&addr, "r1", "u2").await;
    let _ = recv_json(&mut ws1).await; // u2's join

    send_json(
        &mut ws1,
        json!({
            "type": "event",
            "event": "chat",
            "body": { "text": "hello" },
        }),
    )
    .await;

    for ws in [&mut ws1, &mut ws2] {
        let event = recv_json(ws).await;
        assert_eq!(event["type"], "event");
        assert_eq!(event["event"], "chat");
        assert_eq!(event["body"]["text"], "hello");
        // playerId was omitted — the hub fills in the sender.
        assert_eq!(event["playerId"], "u1");
    }
}

#[tokio::test]
async fn test_event_explicit_player_id_is_passed_through() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;

    send_json(
        &mut ws1,
        json!({
            "type": "event",
            "event": "spawn",
            "body": 7,
            "playerId": "npc-1",
        }),
    )
    .await;

    let event = recv_json(&mut ws1).await;
    assert_eq!(event["playerId"], "npc-1");
    assert_eq!(event["body"], 7);
}

#[tokio::test]
async fn test_events_stay_inside_their_room() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;
    let mut other = join(&addr, "r2", "u2").await;

    send_json(
        &mut ws1,
        json!({ "type": "event", "event": "move", "body": [1, 2] }),
    )
    .await;

    let event = recv_json(&mut ws1).await;
    assert_eq!(event["event"], "move");
    assert_silent(&mut other).await;
}

#[tokio::test]
async fn test_rooms_are_scoped_per_app() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;

    // Same roomId, different appId — a different room entirely.
    let mut ws2 = connect(&addr).await;
    send_json(
        &mut ws2,
        json!({
            "type": "join",
            "appId": "app2",
            "roomId": "r1",
            "userId": "u2",
            "state": {},
        }),
    )
    .await;
    let echo = recv_json(&mut ws2).await;
    assert_eq!(echo["playerId"], "u2");

    assert_silent(&mut ws1).await;
}

// =========================================================================
// State updates
// =========================================================================

#[tokio::test]
async fn test_state_defaults_player_id_to_sender_and_rebroadcasts() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;
    let mut ws2 = join(&addr, "r1", "u2").await;
    let _ = recv_json(&mut ws1).await; // u2's join

    send_json(
        &mut ws1,
        json!({ "type": "state", "state": { "hp": 9 } }),
    )
    .await;

    for ws in [&mut ws1, &mut ws2] {
        let state = recv_json(ws).await;
        assert_eq!(state["type"], "state");
        assert_eq!(state["playerId"], "u1");
        assert_eq!(state["state"]["hp"], 9);
    }
}

#[tokio::test]
async fn test_state_is_a_full_overwrite() {
    let addr = start_hub().await;
    let mut ws = connect(&addr).await;
    send_json(
        &mut ws,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": "r1",
            "userId": "u1",
            "state": { "hp": 10, "mp": 5 },
        }),
    )
    .await;
    let _ = recv_json(&mut ws).await; // join echo

    send_json(
        &mut ws,
        json!({ "type": "state", "state": { "hp": 3 } }),
    )
    .await;

    let state = recv_json(&mut ws).await;
    assert_eq!(state["state"]["hp"], 3);
    assert_eq!(state["state"].get("mp"), None, "mp should be dropped");
}

#[tokio::test]
async fn test_state_for_unknown_player_is_dropped() {
    let addr = start_hub().await;
    let mut ws = join(&addr, "r1", "u1").await;

    send_json(
        &mut ws,
        json!({
            "type": "state",
            "playerId": "ghost",
            "state": { "hp": 1 },
        }),
    )
    .await;

    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_malformed_frame_does_not_kill_the_connection() {
    let addr = start_hub().await;
    let mut ws = join(&addr, "r1", "u1").await;

    ws.send(Message::Text("{broken".into())).await.expect("send");

    // The connection survives: a follow-up event still round-trips.
    send_json(
        &mut ws,
        json!({ "type": "event", "event": "ping", "body": null }),
    )
    .await;
    let event = recv_json(&mut ws).await;
    assert_eq!(event["event"], "ping");
}

// =========================================================================
// Leave
// =========================================================================

#[tokio::test]
async fn test_disconnect_broadcasts_leave() {
    let addr = start_hub().await;
    let mut ws1 = join(&addr, "r1", "u1").await;
    let ws2 = join(&addr, "r1", "u2").await;
    let _ = recv_json(&mut ws1).await; // u2's join

    drop(ws2);

    let leave = recv_json(&mut ws1).await;
    assert_eq!(leave["type"], "leave");
    assert_eq!(leave["playerId"], "u2");
}

#[tokio::test]
async fn test_room_resets_after_everyone_leaves() {
    let addr = start_hub().await;
    {
        let mut ws = connect(&addr).await;
        send_json(
            &mut ws,
            json!({
                "type": "join",
                "appId": "app1",
                "roomId": "r1",
                "userId": "u1",
                "state": { "hp": 2 },
            }),
        )
        .await;
        let _ = recv_json(&mut ws).await;
    }
    // Give the disconnect time to reap the room.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The recreated room knows nothing about u1's old state.
    let mut ws = connect(&addr).await;
    send_json(
        &mut ws,
        json!({
            "type": "join",
            "appId": "app1",
            "roomId": "r1",
            "userId": "u1",
            "state": {},
        }),
    )
    .await;
    let echo = recv_json(&mut ws).await;
    assert_eq!(echo["playerId"], "u1");
    assert_eq!(echo["state"], json!({}));
}
