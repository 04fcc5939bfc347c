// SPDX-License-Identifier: MIT

//! Log sink abstraction.
//!
//! Fault messages are routed through a [`LogSink`] owned by the filesystem handle.
//! The sink decides formatting and destination; rate limiting happens before it.

use core::fmt;
use parking_lot::Mutex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERR ",
        }
    }
}

/// One emitted fault message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    /// Rendered scope, `"<fs>"` or `"<fs> (<dev>)"`.
    pub scope: String,
    pub msg: String,
}

impl Record {
    pub fn new(level: Level, scope: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            level,
            scope: scope.into(),
            msg: msg.into(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.msg)
    }
}

/// Destination for fault messages.
///
/// Implementations must not block indefinitely; they are called from IO completion paths.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &Record);
}

/// Forwards records to the `log` facade under the `rimfault` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn emit(&self, record: &Record) {
        match record.level {
            Level::Error => log::error!(target: "rimfault", "{record}"),
            Level::Warn => log::warn!(target: "rimfault", "{record}"),
            Level::Info => log::info!(target: "rimfault", "{record}"),
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Messages only, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.msg.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.msg.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &Record) {
        self.records.lock().push(record.clone());
    }
}
