//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use artifact_sweeper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{AswError, Result};
pub use crate::core::session::RunSession;
pub use crate::core::signals::ShutdownSignal;

// Logging
pub use crate::logger::{ConsoleSink, FileSink, Level, LoggerHandle, MemorySink, spawn_logger};

// Platform
pub use crate::platform::{ArtifactService, ConfigureOutcome, JfrogCli, MockArtifactService};

// Sweep
pub use crate::report::{DeleteOutcome, OutcomeStatus, RunSummary};
pub use crate::sweep::{
    ArtifactRecord, DeleteDispatcher, ExclusionSet, Repository, SweepRequest, Sweeper,
};
