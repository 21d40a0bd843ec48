use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use shadow_core::LogSink;

/// Forwards each line to `tracing` at INFO under the `shadow_rpc::log` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn append(&self, line: &str) {
        tracing::info!(target: "shadow_rpc::log", "{line}");
    }
}

/// Bounded history of `[HH:MM:SS] line` entries, oldest evicted first.
///
/// `append` never waits: if another thread holds the buffer the line is
/// dropped and counted in [`dropped`](Self::dropped).
pub struct MemoryLogSink {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
    dropped: AtomicU64,
}

impl MemoryLogSink {
    /// Create a history holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Snapshot of the history, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }

    /// Write the history to `path`, one line each, replacing any previous
    /// file. Parent directories are created.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = self.lines().join("\n");
        text.push('\n');
        std::fs::write(path, text)
    }

    /// Lines lost to lock contention.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push_at(&self, now: DateTime<Local>, line: &str) {
        let Some(mut lines) = self.lines.try_lock() else {
            let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if lines.len() == self.capacity {
            let _ = lines.pop_front();
        }
        lines.push_back(format_line(now, line));
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, line: &str) {
        self.push_at(Local::now(), line);
    }
}

fn format_line(now: DateTime<Local>, line: &str) -> String {
    format!("[{}] {line}", now.format("%H:%M:%S"))
}

/// Appends every line to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutLogSink {
    /// Create an empty fanout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl LogSink for FanoutLogSink {
    fn append(&self, line: &str) {
        for sink in &self.sinks {
            sink.append(line);
        }
    }
}
