//! Runtime client SDK for Roomcast hubs.
//!
//! This is the Rust counterpart of the browser SDK: connect to a hub,
//! join a room, mirror its presence locally, and react to events.
//!
//! # Key types
//!
//! - [`RuntimeClient`] — one room connection with a presence mirror
//! - [`AppRuntime`] — client plus room- and app-scoped KV storage
//! - [`RuntimeConfig`] — endpoint configuration (`SOCKET_URL`)

mod client;
mod config;
mod error;
mod runtime;

pub use client::RuntimeClient;
pub use config::{RuntimeConfig, SOCKET_URL_ENV};
pub use error::ClientError;
pub use runtime::AppRuntime;

// Re-exported so handler signatures can be written without extra deps.
pub use roomcast_presence::Player;
pub use roomcast_protocol::{Json, StateMap};
