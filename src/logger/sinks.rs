//! Log sinks: console (info and up), run log file (everything), and an
//! in-memory sink for tests.
//!
//! Sinks are owned by the logger thread, so none of them needs internal
//! locking except [`MemorySink`], whose buffer is also read by the test.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::core::errors::{AswError, Result};

/// Timestamp format of every emitted line.
const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a log record. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    /// Upper-case tag rendered between brackets.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// One emitted log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub at: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogRecord {
    /// Stamp a record with the current local time.
    pub fn now(level: Level, message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// `YYYY-mm-dd HH:MM:SS [LEVEL] message`, without trailing newline.
    pub fn render(&self) -> String {
        format!(
            "{} [{}] {}",
            self.at.format(LINE_TIME_FORMAT),
            self.level.label(),
            self.message
        )
    }
}

/// Destination for rendered log records.
pub trait LogSink: Send {
    /// Records below this level are not written to the sink.
    fn min_level(&self) -> Level;
    /// Write one record.
    fn write(&mut self, record: &LogRecord);
    /// Flush any buffered output.
    fn flush(&mut self) {}
}

// ──────────────────── console ────────────────────

/// Standard-output sink. Colors the level tag when attached to a terminal.
#[derive(Debug)]
pub struct ConsoleSink {
    min_level: Level,
    colorize: bool,
}

impl ConsoleSink {
    /// Console sink filtered at `min_level`; color is enabled only for a TTY.
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            colorize: io::stdout().is_terminal(),
        }
    }

    /// Force color on or off (e.g. `--no-color`).
    #[must_use]
    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    fn render(&self, record: &LogRecord) -> String {
        if !self.colorize {
            return record.render();
        }
        format!(
            "{} [{}] {}",
            record.at.format(LINE_TIME_FORMAT),
            colored_label(record.level),
            record.message
        )
    }
}

#[cfg(feature = "cli")]
fn colored_label(level: Level) -> String {
    use colored::Colorize;

    let label = level.label();
    match level {
        Level::Debug => label.dimmed().to_string(),
        Level::Info => label.green().to_string(),
        Level::Warning => label.yellow().bold().to_string(),
        Level::Error => label.red().bold().to_string(),
    }
}

#[cfg(not(feature = "cli"))]
fn colored_label(level: Level) -> String {
    level.label().to_string()
}

impl LogSink for ConsoleSink {
    fn min_level(&self) -> Level {
        self.min_level
    }

    fn write(&mut self, record: &LogRecord) {
        let line = self.render(record);
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    fn flush(&mut self) {
        let _ = io::stdout().flush();
    }
}

// ──────────────────── file ────────────────────

/// Append-only run log file. Falls back to stderr if a write fails, so a
/// full disk never takes down the sweep.
pub struct FileSink {
    path: PathBuf,
    min_level: Level,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create (or append to) the log file at `path`.
    pub fn create(path: &Path, min_level: Level) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AswError::io(path, source))?;
        Ok(Self {
            path: path.to_path_buf(),
            min_level,
            writer: Some(BufWriter::with_capacity(64 * 1024, file)),
        })
    }
}

impl LogSink for FileSink {
    fn min_level(&self) -> Level {
        self.min_level
    }

    fn write(&mut self, record: &LogRecord) {
        let line = format!("{}\n", record.render());
        if let Some(w) = self.writer.as_mut() {
            if w.write_all(line.as_bytes()).is_ok() {
                return;
            }
            let _ = writeln!(
                io::stderr(),
                "[ASW-LOG] write to {} failed, continuing on stderr",
                self.path.display()
            );
            self.writer = None;
        }
        let _ = write!(io::stderr(), "[ASW-LOG] {line}");
    }

    fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
            let _ = w.get_ref().sync_data();
        }
    }
}

// ──────────────────── memory ────────────────────

/// Captures records in memory. Clones share the same buffer.
#[derive(Clone, Debug)]
pub struct MemorySink {
    min_level: Level,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new(min_level: Level) -> Self {
        Self {
            min_level,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Captured messages (without timestamp or level).
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }

    /// Number of captured records at exactly `level`.
    pub fn count_at(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }
}

impl LogSink for MemorySink {
    fn min_level(&self) -> Level {
        self.min_level
    }

    fn write(&mut self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}
