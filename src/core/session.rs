//! Per-run identity: start timestamp for output file names and a randomized
//! server id for the external tool's configuration.

use chrono::{DateTime, Local};

/// Timestamp format embedded in log and report file names.
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identity of one sweep run.
#[derive(Debug, Clone)]
pub struct RunSession {
    started_at: DateTime<Local>,
    server_id: String,
}

impl RunSession {
    /// Start a new session now, with a fresh `<prefix>-<8 hex>` server id.
    pub fn start(server_id_prefix: &str) -> Self {
        Self::at(Local::now(), server_id_prefix)
    }

    /// Start a session at a fixed instant (tests).
    pub fn at(started_at: DateTime<Local>, server_id_prefix: &str) -> Self {
        let suffix: u32 = rand::random();
        Self {
            started_at,
            server_id: format!("{server_id_prefix}-{suffix:08x}"),
        }
    }

    /// Wall-clock start of the run.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Identifier used with `jf config add/use`; unique per run so concurrent
    /// runs on the same host do not collide.
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// `YYYYmmdd_HHMMSS` stamp shared by every output file of this run.
    pub fn file_stamp(&self) -> String {
        self.started_at.format(FILE_STAMP_FORMAT).to_string()
    }

    /// File name of the run log.
    pub fn log_file_name(&self) -> String {
        format!("clean_old_artifacts_{}.log", self.file_stamp())
    }

    /// File name of the CSV report.
    pub fn report_file_name(&self) -> String {
        format!("clean-up-{}.csv", self.file_stamp())
    }
}
