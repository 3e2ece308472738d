//! Bounded in-memory log of proxy activity, served at `/logs`.
//!
//! The buffer is an explicit collaborator handed to the request handler; it does
//! not intercept stdout or the tracing subscriber. Once full, the oldest entry
//! is dropped for every new one.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::Level;

/// One recorded line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at.to_rfc3339_opts(SecondsFormat::Millis, true);
        if self.level == Level::INFO {
            write!(f, "[{}] {}", at, self.message)
        } else {
            write!(f, "[{}] [{}] {}", at, self.level, self.message)
        }
    }
}

/// Append-only ring buffer of [`LogEntry`].
#[derive(Debug)]
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, level: Level, message: impl Into<String>) {
        let entry = LogEntry {
            at: Utc::now(),
            level,
            message: message.into(),
        };
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(Level::INFO, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.record(Level::WARN, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(Level::ERROR, message);
    }

    /// Entries from oldest to newest.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// One line per entry, oldest first.
    pub fn render(&self) -> String {
        let entries = self.entries.lock();
        let mut out = String::new();
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&entry.to_string());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
