// SPDX-License-Identifier: MIT

use colored::Colorize;
use rimfault::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::{LogLevel, log_level};

/// Prints fault records to the terminal.
///
/// Errors always print, warnings and infos follow the log level.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    emitted: AtomicUsize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn render(record: &Record) -> String {
        let tag = match record.level {
            Level::Error => record.level.tag().red().bold(),
            Level::Warn => record.level.tag().yellow(),
            Level::Info => record.level.tag().normal(),
        };
        format!("[rimfsck] {tag} {}: {}", record.scope.dimmed(), record.msg)
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, record: &Record) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let show = match record.level {
            Level::Error => true,
            Level::Warn => log_level() != LogLevel::Quiet,
            Level::Info => log_level() == LogLevel::Verbose,
        };
        if show {
            println!("{}", Self::render(record));
        }
    }
}
