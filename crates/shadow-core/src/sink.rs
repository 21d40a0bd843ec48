//! Injected capabilities: where presences go and where log lines go.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::TransmissionError;
use crate::presence::PresenceUpdate;

/// Transmits a presence to the broadcasting service.
///
/// One instance is shared by every request handler, so implementations must
/// be `Send + Sync`. A client that cannot take concurrent publishes should be
/// wrapped in [`SerializedSink`].
#[async_trait]
pub trait PresenceSink: Send + Sync {
    /// Replace the broadcast presence with `update`.
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError>;
}

#[async_trait]
impl<T: PresenceSink + ?Sized> PresenceSink for Arc<T> {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
        (**self).publish(update).await
    }
}

/// Serializes publishes through a mutex held only for the publish call.
///
/// Concurrent callers queue on the lock in arrival order at the mutex; which
/// of two racing requests reaches it first is not defined.
pub struct SerializedSink<S> {
    inner: Mutex<S>,
}

impl<S> SerializedSink<S> {
    /// Wrap a sink.
    pub fn new(inner: S) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Unwrap the inner sink.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

#[async_trait]
impl<S: PresenceSink> PresenceSink for SerializedSink<S> {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
        let inner = self.inner.lock().await;
        inner.publish(update).await
    }
}

/// Logs each update instead of broadcasting it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingPresenceSink;

#[async_trait]
impl PresenceSink for TracingPresenceSink {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
        info!(
            state = %update.state,
            details = %update.details,
            link_count = update.link_count(),
            time_range = ?update.time_range,
            "dry run, presence not broadcast"
        );
        Ok(())
    }
}

/// User-visible log. Fire-and-forget: `append` must not block request handling
/// and has no way to report failure.
pub trait LogSink: Send + Sync {
    /// Record one line.
    fn append(&self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn append(&self, line: &str) {
        (**self).append(line);
    }
}

/// Discards every line.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn append(&self, _line: &str) {}
}
