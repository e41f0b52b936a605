//! Indentation-aware logging.
//!
//! `Logger` prefixes every line with two spaces per open indentation scope and
//! hands the rendered line to a [`LogSink`]. The default sink forwards to the
//! `log` facade (initialized with env_logger by the binary); [`MemorySink`]
//! keeps lines in memory so tests can assert on them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::Level;

const INDENT_UNIT: &str = "  ";

/// Destination for rendered log lines
pub trait LogSink: Send + Sync {
    fn write_line(&self, level: Level, line: &str);
}

/// Forwards rendered lines to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn write_line(&self, level: Level, line: &str) {
        log::log!(target: "clipshift", level, "{}", line);
    }
}

/// Captures rendered lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether any captured line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, _level: Level, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Logger shared by the loops and the paste orchestrator.
///
/// Clones share the same sink and the same indentation depth.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    depth: Arc<AtomicUsize>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(FacadeSink))
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("depth", &self.depth()).finish()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            depth: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Level::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Level::Error, message.as_ref());
    }

    pub fn verbose(&self, message: impl AsRef<str>) {
        self.write(Level::Debug, message.as_ref());
    }

    /// Open an indentation scope that lasts until the guard is dropped
    pub fn indent(&self) -> IndentGuard {
        self.depth.fetch_add(1, Ordering::SeqCst);
        IndentGuard {
            depth: Arc::clone(&self.depth),
        }
    }

    /// Current number of open indentation scopes
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    fn write(&self, level: Level, message: &str) {
        let line = format!("{}{}: {}", INDENT_UNIT.repeat(self.depth()), label(level), message);
        self.sink.write_line(level, &line);
    }
}

fn label(level: Level) -> &'static str {
    match level {
        Level::Error => "Error",
        Level::Warn => "Warning",
        Level::Info => "Information",
        Level::Debug | Level::Trace => "Verbose",
    }
}

/// Releases one indentation level when dropped
#[must_use = "indentation is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct IndentGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
