//! Scoreboard demo: two players in one room, scoring points.
//!
//! Shows the three layers working together against an in-process hub:
//! presence (ready flags), events (score announcements), and the KV
//! store (the durable tally that survives reconnects).

use std::collections::HashMap;
use std::time::Duration;

use roomcast::prelude::*;
use roomcast_client::{AppRuntime, RuntimeConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // The hub runs in-process here; a real deployment runs it standalone
    // and points clients at it via SOCKET_URL.
    let server = HubServer::builder().bind("127.0.0.1:0").build().await?;
    let addr = server.local_addr()?;
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let config = RuntimeConfig::from_env().endpoint(format!("ws://{addr}"));
    let backend = MemoryBackend::new();

    let alice =
        AppRuntime::connect(&config, backend.clone(), "arena", "match-1", "alice")
            .await?;
    let bob =
        AppRuntime::connect(&config, backend.clone(), "arena", "match-1", "bob")
            .await?;

    bob.socket()
        .on_join(|player| tracing::info!(player = %player.id, "joined the match"));
    alice.socket().on("score", |body, player| {
        tracing::info!(player = %player.id, points = %body, "scored");
    });

    // Wait for the presence mirrors to converge.
    while alice.socket().player_count() < 2 || bob.socket().player_count() < 2 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Presence: a ready flag every peer can see.
    let mut ready = StateMap::new();
    ready.insert("ready".to_string(), json!(true));
    alice.socket().set_state(ready).await?;

    // Events: fire-and-forget score announcements.
    alice.socket().broadcast("score", json!(3)).await?;
    bob.socket().broadcast("score", json!(5)).await?;

    // Storage: the durable tally, safe against concurrent writers.
    alice
        .kv()
        .update("score:alice", |cur: Option<i64>| cur.unwrap_or(0) + 3)
        .await?;
    bob.kv()
        .update("score:bob", |cur: Option<i64>| cur.unwrap_or(0) + 5)
        .await?;
    bob.global_kv()
        .update("matches_played", |cur: Option<i64>| cur.unwrap_or(0) + 1)
        .await?;

    // Let the event echoes land before reading the board.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let scores: HashMap<String, i64> = alice.kv().list("score:").await?;
    let mut entries: Vec<_> = scores.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    println!("--- scoreboard ---");
    for (key, points) in entries {
        let name = key.strip_prefix("score:").unwrap_or(&key);
        println!("{name:>8}  {points}");
    }
    let played: Option<i64> = alice.global_kv().get("matches_played").await?;
    println!("matches played: {}", played.unwrap_or(0));

    alice.close().await?;
    bob.close().await?;
    Ok(())
}
