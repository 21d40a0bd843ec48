//! Fakes shared by the router and listener tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shadow_core::{LogSink, PresenceSink, PresenceUpdate, TransmissionError};

/// Records published updates, or fails every publish.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<PresenceUpdate>>,
    started: Mutex<usize>,
    fail_with: Option<TransmissionError>,
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn failing(err: TransmissionError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    /// Sleeps for `delay` inside every publish before recording it.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PresenceUpdate> {
        self.published.lock().clone()
    }

    /// Publishes that were entered, finished or not.
    pub fn started(&self) -> usize {
        *self.started.lock()
    }
}

#[async_trait]
impl PresenceSink for RecordingSink {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), TransmissionError> {
        *self.started.lock() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.published.lock().push(update.clone());
        Ok(())
    }
}

/// Keeps every appended line.
#[derive(Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for RecordingLog {
    fn append(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
