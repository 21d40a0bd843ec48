//! # shadow-logging
//!
//! Structured logging with `tracing`, plus [`LogSink`](shadow_core::LogSink)
//! implementations for the user-visible log:
//!
//! - [`TracingLogSink`]: forwards lines to the `tracing` subscriber
//! - [`MemoryLogSink`]: bounded, timestamped history a UI can render
//! - [`FanoutLogSink`]: appends to several sinks

#![deny(unsafe_code)]

mod sinks;

pub use sinks::{FanoutLogSink, MemoryLogSink, TracingLogSink};

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` overrides `level` when set. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}
