//! Injected logging capability
//!
//! The coordinator and its workers never reach for a process-wide logger.
//! They receive an `Arc<dyn Logger>` at construction time and log through it:
//!
//! - **`TracingLogger`**: forwards to the `tracing` macros (the normal choice;
//!   the binary installs the subscriber)
//! - **`CaptureLogger`**: keeps every entry in memory so tests can assert on
//!   what was logged
//! - **`NullLogger`**: drops everything

use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;

/// Leveled log sink
pub trait Logger: Send + Sync {
    /// Emit one message at `level`
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Logger backed by the `tracing` crate
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Create a logger whose events carry `component` as a field
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn shared(component: &'static str) -> Arc<dyn Logger> {
        Arc::new(Self::new(component))
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        let component = self.component;
        // tracing needs the level at compile time
        if level == Level::ERROR {
            tracing::error!(component, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(component, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(component, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(component, "{}", message);
        } else {
            tracing::trace!(component, "{}", message);
        }
    }
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    pub fn shared() -> Arc<dyn Logger> {
        Arc::new(Self)
    }
}

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// One captured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Logger that records entries in memory
///
/// Clones share the same buffer, so a test keeps one clone and hands the other
/// to the code under test.
#[derive(Debug, Clone, Default)]
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries logged at exactly `level`
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Whether any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }
}

impl Logger for CaptureLogger {
    fn log(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
            });
    }
}
