// Diagnostics sink
// The client reports what it sends through a sink it owns. Nothing is global:
// the default sink drops everything, `TracingSink` forwards into `tracing`.

use parking_lot::Mutex;
use tracing::Level;

pub trait DiagnosticsSink: Send + Sync {
    // Must not panic.
    fn log(&self, level: Level, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn log(&self, _level: Level, _message: &str) {}
}

// Forwards messages as `tracing` events with target `tourcms`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "tourcms", "{}", message),
            Level::WARN => tracing::warn!(target: "tourcms", "{}", message),
            Level::INFO => tracing::info!(target: "tourcms", "{}", message),
            Level::DEBUG => tracing::debug!(target: "tourcms", "{}", message),
            _ => tracing::trace!(target: "tourcms", "{}", message),
        }
    }
}

// Keeps every message in memory, at or above `min_level` in severity.
#[derive(Debug)]
pub struct MemorySink {
    min_level: Level,
    records: Mutex<Vec<(Level, String)>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(Level::TRACE)
    }
}

impl MemorySink {
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        // tracing orders levels by verbosity: ERROR < TRACE
        if level <= self.min_level {
            self.records.lock().push((level, message.to_string()));
        }
    }
}
