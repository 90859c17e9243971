//! Run logger: one dedicated thread fans each record out to every sink.
//!
//! Architecture: the logger thread owns the sinks. All other threads send
//! records through a bounded crossbeam channel via a cloneable
//! [`LoggerHandle`]. Sends block when the channel is full; the run log is an
//! audit trail, so records are never dropped for back-pressure.

#![allow(missing_docs)]

use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::core::errors::{AswError, Result};
use crate::logger::sinks::{Level, LogRecord, LogSink};

/// Default bounded channel capacity for log records.
pub const CHANNEL_CAPACITY: usize = 1024;

enum LoggerMessage {
    Record(LogRecord),
    /// Sentinel to request graceful shutdown of the logger thread.
    Shutdown,
}

// ──────────────────── public handle ────────────────────

/// Thread-safe, cheaply-cloneable handle for emitting log records.
#[derive(Clone)]
pub struct LoggerHandle {
    tx: Sender<LoggerMessage>,
}

impl LoggerHandle {
    /// A handle whose records go nowhere.
    pub fn null() -> Self {
        let (tx, _rx) = bounded(1);
        Self { tx }
    }

    /// Emit a record at `level`.
    ///
    /// After shutdown the logger thread is gone and records are discarded.
    pub fn log(&self, level: Level, message: impl Into<String>) {
        let _ = self
            .tx
            .send(LoggerMessage::Record(LogRecord::now(level, message)));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// Request graceful shutdown. Records already queued are still written.
    pub fn shutdown(&self) {
        let _ = self.tx.send(LoggerMessage::Shutdown);
    }
}

// ──────────────────── spawn ────────────────────

/// Spawn the logger thread over `sinks` and return a handle.
///
/// The logger thread runs until `handle.shutdown()` is called or all handles
/// are dropped; either way every sink is flushed before the thread exits.
pub fn spawn_logger(
    sinks: Vec<Box<dyn LogSink>>,
    channel_capacity: usize,
) -> Result<(LoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<LoggerMessage>(channel_capacity.max(1));

    let join = thread::Builder::new()
        .name("asweep-logger".to_string())
        .spawn(move || logger_thread_main(&rx, sinks))
        .map_err(|e| AswError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((LoggerHandle { tx }, join))
}

#[allow(clippy::needless_pass_by_value)]
fn logger_thread_main(rx: &Receiver<LoggerMessage>, mut sinks: Vec<Box<dyn LogSink>>) {
    while let Ok(message) = rx.recv() {
        match message {
            LoggerMessage::Record(record) => {
                for sink in &mut sinks {
                    if record.level >= sink.min_level() {
                        sink.write(&record);
                    }
                }
            }
            LoggerMessage::Shutdown => break,
        }
    }

    for sink in &mut sinks {
        sink.flush();
    }
}

// ──────────────────── tests ────────────────────
