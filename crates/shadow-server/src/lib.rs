//! # shadow-server
//!
//! Loopback HTTP listener for presence updates.
//!
//! - One route: `POST /update_rpc`; every other method or path gets a 405
//! - Each request is normalized and published through a shared
//!   [`Dispatcher`](shadow_core::Dispatcher)
//! - [`Listener`] owns the `Stopped`/`Running` lifecycle; stopping stops
//!   accepting and lets in-flight requests finish

#![deny(unsafe_code)]

mod accept;
pub mod config;
pub mod listener;
pub mod routes;

#[cfg(test)]
mod test_support;

pub use config::ListenerConfig;
pub use listener::{DRAIN_TIMEOUT, Listener, ListenerError, ListenerState};
pub use routes::{AppState, build_router};
