//! Run logging: a dedicated logger thread writing to console and file sinks.

pub mod dual;
pub mod sinks;

pub use dual::{LoggerHandle, spawn_logger};
pub use sinks::{ConsoleSink, FileSink, Level, LogRecord, LogSink, MemorySink};
