//! Per-artifact outcome records and the end-of-run summary.

#![allow(missing_docs)]

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Final classification of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Skipped,
    Deleted,
    Error,
}

impl OutcomeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Deleted => "deleted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened to one artifact. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub repository: String,
    pub path: String,
    pub status: OutcomeStatus,
    /// Matched exclusion patterns joined with `", "`; set only when skipped.
    pub matched_pattern: Option<String>,
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn skipped(
        repository: impl Into<String>,
        path: impl Into<String>,
        matched_pattern: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            path: path.into(),
            status: OutcomeStatus::Skipped,
            matched_pattern: Some(matched_pattern.into()),
            error: None,
        }
    }

    pub fn deleted(repository: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            path: path.into(),
            status: OutcomeStatus::Deleted,
            matched_pattern: None,
            error: None,
        }
    }

    pub fn error(
        repository: impl Into<String>,
        path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            path: path.into(),
            status: OutcomeStatus::Error,
            matched_pattern: None,
            error: Some(error.into()),
        }
    }
}

// ──────────────────── summary ────────────────────

/// Counters for one run, logged when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,
    pub failed_queries: usize,
    pub artifacts_found: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub errors: usize,
    pub interrupted: bool,
    pub report_file: Option<PathBuf>,
}

impl RunSummary {
    /// Count `outcomes` into the status tallies.
    pub fn tally(&mut self, outcomes: &[DeleteOutcome]) {
        for outcome in outcomes {
            match outcome.status {
                OutcomeStatus::Skipped => self.skipped += 1,
                OutcomeStatus::Deleted => self.deleted += 1,
                OutcomeStatus::Error => self.errors += 1,
            }
        }
    }

    pub fn outcomes(&self) -> usize {
        self.skipped + self.deleted + self.errors
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} repositories processed ({} failed queries); {} artifacts found: {} skipped, {} deleted, {} errors",
            self.repositories,
            self.failed_queries,
            self.artifacts_found,
            self.skipped,
            self.deleted,
            self.errors,
        )?;
        if self.interrupted {
            f.write_str(" (interrupted)")?;
        }
        Ok(())
    }
}
