//! Top-level CLI definition and dispatch.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::control;
use thiserror::Error;

use artifact_sweeper::core::config::Config;
use artifact_sweeper::core::errors::AswError;
use artifact_sweeper::core::session::RunSession;
use artifact_sweeper::core::signals::ShutdownSignal;
use artifact_sweeper::logger::dual::CHANNEL_CAPACITY;
use artifact_sweeper::logger::{ConsoleSink, FileSink, Level, LogSink, spawn_logger};
use artifact_sweeper::platform::JfrogCli;
use artifact_sweeper::report::RunSummary;
use artifact_sweeper::sweep::{SweepRequest, Sweeper};

/// Delete old artifacts from JFrog repositories.
#[derive(Parser)]
#[command(
    name = "asweep",
    author,
    version,
    about = "Delete old artifacts from JFrog repositories.",
    long_about = None
)]
pub struct Cli {
    /// Artifactory base URL.
    #[arg(long, value_name = "URL")]
    artifactory_url: String,
    /// JFrog access token.
    #[arg(long, value_name = "TOKEN")]
    access_token: String,
    /// Retention window (e.g. 90d, 3mo, 1y).
    #[arg(long, value_name = "WINDOW")]
    older_than: String,
    /// Path to exclusions JSON file.
    #[arg(long, value_name = "PATH")]
    exclusions_file: PathBuf,
    /// Path to AQL spec file.
    #[arg(long, value_name = "PATH")]
    aql_spec: PathBuf,
    /// List deletions without executing them.
    #[arg(long)]
    dry_run: bool,
    /// Number of parallel threads to use for deletion [default: 4].
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory for the run log and CSV report [default: .].
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// JFrog CLI binary [default: jf].
    #[arg(long, value_name = "PATH")]
    jf_binary: Option<PathBuf>,
    /// Kill a delete that runs longer than this; 0 waits forever [default: 300].
    #[arg(long, value_name = "SECS")]
    delete_timeout_secs: Option<u64>,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

impl fmt::Debug for Cli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cli")
            .field("artifactory_url", &self.artifactory_url)
            .field("access_token", &"***")
            .field("older_than", &self.older_than)
            .field("exclusions_file", &self.exclusions_file)
            .field("aql_spec", &self.aql_spec)
            .field("dry_run", &self.dry_run)
            .field("threads", &self.threads)
            .field("config", &self.config)
            .field("output_dir", &self.output_dir)
            .field("jf_binary", &self.jf_binary)
            .field("delete_timeout_secs", &self.delete_timeout_secs)
            .field("no_color", &self.no_color)
            .finish()
    }
}

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or flag values are unusable.
    #[error("{0}")]
    Config(AswError),
    /// Setup or run failure.
    #[error("{0}")]
    Fatal(AswError),
    /// The run was stopped by a signal; the partial report was written.
    #[error("interrupted: {0}")]
    Interrupted(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Fatal(_) => 1,
            Self::Interrupted(_) => 130,
        }
    }
}

impl Cli {
    /// Resolve config file + env, then apply flags on top.
    fn resolve_config(&self) -> Result<Config, CliError> {
        let mut config = Config::load(self.config.as_deref()).map_err(CliError::Config)?;
        if let Some(threads) = self.threads {
            config.cleanup.threads = threads;
        }
        if self.dry_run {
            config.cleanup.dry_run = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir.clone_from(dir);
        }
        if let Some(binary) = &self.jf_binary {
            config.tool.jf_binary.clone_from(binary);
        }
        if let Some(secs) = self.delete_timeout_secs {
            config.tool.delete_timeout_secs = secs;
        }
        config.validate().map_err(CliError::Config)?;
        Ok(config)
    }
}

/// Run one sweep with the parsed arguments.
pub fn run(cli: &Cli) -> Result<RunSummary, CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = cli.resolve_config()?;
    fs::create_dir_all(&config.output.dir)
        .map_err(|e| CliError::Fatal(AswError::io(&config.output.dir, e)))?;

    let session = RunSession::start(&config.tool.server_id_prefix);
    let log_path = config.output.dir.join(session.log_file_name());
    let mut console = ConsoleSink::new(Level::Info);
    if cli.no_color {
        console = console.with_color(false);
    }
    let sinks: Vec<Box<dyn LogSink>> = vec![
        Box::new(console),
        Box::new(FileSink::create(&log_path, Level::Debug).map_err(CliError::Fatal)?),
    ];
    let (logger, logger_thread) = spawn_logger(sinks, CHANNEL_CAPACITY).map_err(CliError::Fatal)?;
    logger.info(format!("Logging to {}", log_path.display()));
    if let Some(source) = &config.source {
        logger.debug(format!("configuration loaded from {}", source.display()));
    }

    let timeout = match config.tool.delete_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let service = Arc::new(JfrogCli::new(config.tool.jf_binary.clone(), timeout));
    let request = SweepRequest {
        artifactory_url: cli.artifactory_url.clone(),
        access_token: cli.access_token.clone(),
        older_than: cli.older_than.clone(),
        exclusions_file: cli.exclusions_file.clone(),
        aql_spec: cli.aql_spec.clone(),
        dry_run: config.cleanup.dry_run,
        threads: config.cleanup.threads,
        output_dir: config.output.dir.clone(),
    };

    let outcome = Sweeper::new(service, logger.clone(), session)
        .with_shutdown(ShutdownSignal::install())
        .run(&request);
    logger.shutdown();
    let _ = logger_thread.join();

    let summary = outcome.map_err(CliError::Fatal)?;
    if summary.interrupted {
        let report = summary
            .report_file
            .as_ref()
            .map_or_else(String::new, |p| format!("partial report at {}", p.display()));
        return Err(CliError::Interrupted(report));
    }
    Ok(summary)
}
