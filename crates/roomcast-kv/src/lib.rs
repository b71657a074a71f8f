//! Namespaced key-value storage for Roomcast apps.
//!
//! Player presence is ephemeral; anything that must survive a
//! reconnect — scores, inventories, match history — goes through a
//! [`KvStore`]. Stores are namespaced per room or per app, values are
//! JSON, and [`KvStore::update`] is the one read-modify-write
//! primitive that is safe against concurrent writers.
//!
//! # Key types
//!
//! - [`KvStore`] — namespaced get/set/delete/list/update
//! - [`KvBackend`] — the raw backend seam (swap without touching callers)
//! - [`MemoryBackend`] — process-local backend for tests and demos
//! - [`RedisBackend`] — production backend (feature `redis`, default)
//!
//! # Feature Flags
//!
//! - `redis` (default) — Redis backend via the `redis` crate

#![allow(async_fn_in_trait)]

mod backend;
mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;
mod store;

pub use backend::KvBackend;
pub use error::KvError;
pub use memory::MemoryBackend;
#[cfg(feature = "redis")]
pub use redis_backend::RedisBackend;
pub use store::{KvStore, MAX_UPDATE_ATTEMPTS};
