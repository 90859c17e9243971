//! Run reporting: outcome records, the CSV report, and log tables.

pub mod csv_report;
pub mod outcome;
pub mod table;

pub use csv_report::{write_report, write_report_to};
pub use outcome::{DeleteOutcome, OutcomeStatus, RunSummary};
pub use table::{log_repository_table, render_table};
