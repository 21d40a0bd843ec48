//! # shadow-discord
//!
//! [`PresenceSink`](shadow_core::PresenceSink) backed by the local Discord
//! client's IPC channel (a Unix socket or a Windows named pipe).
//!
//! - [`frame`]: the 8-byte header + JSON framing
//! - [`activity`]: [`PresenceUpdate`](shadow_core::PresenceUpdate) → `SET_ACTIVITY` payload
//! - [`transport`]: IPC endpoint discovery and the [`Connect`] seam
//! - [`DiscordIpcSink`]: lazy connect, reconnect on the next publish after a
//!   lost session, clear-on-disconnect

#![deny(unsafe_code)]

pub mod activity;
mod client;
mod errors;
pub mod frame;
pub mod transport;

pub use client::{DiscordIpcSink, IpcStream};
pub use errors::IpcError;
pub use transport::{Connect, Endpoint};
