//! Semicolon-delimited end-of-run report.

#![allow(missing_docs)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::core::errors::{AswError, Result};
use crate::report::outcome::{DeleteOutcome, OutcomeStatus};

/// Column order of the report.
pub const HEADER: [&str; 5] = ["Repository", "Path", "Status", "Exclusion Pattern", "Error"];

pub const DELIMITER: u8 = b';';

#[derive(Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Repository")]
    repository: &'a str,
    #[serde(rename = "Path")]
    path: &'a str,
    #[serde(rename = "Status")]
    status: OutcomeStatus,
    #[serde(rename = "Exclusion Pattern")]
    matched_pattern: &'a str,
    #[serde(rename = "Error")]
    error: &'a str,
}

impl<'a> From<&'a DeleteOutcome> for ReportRow<'a> {
    fn from(outcome: &'a DeleteOutcome) -> Self {
        Self {
            repository: &outcome.repository,
            path: &outcome.path,
            status: outcome.status,
            matched_pattern: outcome.matched_pattern.as_deref().unwrap_or(""),
            error: outcome.error.as_deref().unwrap_or(""),
        }
    }
}

/// Write `outcomes` to `writer`. The header is written even when there are
/// no rows.
pub fn write_report_to<W: Write>(writer: W, outcomes: &[DeleteOutcome]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    for outcome in outcomes {
        wtr.serialize(ReportRow::from(outcome))?;
    }
    wtr.flush().map_err(|e| AswError::Serialization {
        context: "csv report",
        details: e.to_string(),
    })
}

/// Create (or truncate) the report file at `path`.
pub fn write_report(path: &Path, outcomes: &[DeleteOutcome]) -> Result<()> {
    let file = File::create(path).map_err(|e| AswError::io(path, e))?;
    write_report_to(file, outcomes)
}
