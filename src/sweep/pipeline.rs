//! End-to-end sweep: configure the tool, load exclusions, enumerate
//! repositories, then find, filter and delete per repository and write the
//! cumulative report.
//!
//! Fatal setup failures are logged and returned as errors. Everything past
//! setup is isolated per repository (query failures) or per artifact (delete
//! failures) and only shows up in the log and the report.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::core::errors::{AswError, Result};
use crate::core::session::RunSession;
use crate::core::signals::ShutdownSignal;
use crate::logger::LoggerHandle;
use crate::platform::{ArtifactService, ConfigureOutcome};
use crate::report::{DeleteOutcome, RunSummary, log_repository_table, write_report};
use crate::sweep::dispatcher::DeleteDispatcher;
use crate::sweep::exclusions::ExclusionSet;
use crate::sweep::finder::find_old_artifacts;
use crate::sweep::repositories::list_repositories;

/// Inputs of one sweep run.
#[derive(Clone)]
pub struct SweepRequest {
    pub artifactory_url: String,
    pub access_token: String,
    /// Retention window, passed through to the query untouched.
    pub older_than: String,
    pub exclusions_file: PathBuf,
    pub aql_spec: PathBuf,
    pub dry_run: bool,
    pub threads: usize,
    /// Directory receiving the CSV report.
    pub output_dir: PathBuf,
}

impl fmt::Debug for SweepRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepRequest")
            .field("artifactory_url", &self.artifactory_url)
            .field("access_token", &"***")
            .field("older_than", &self.older_than)
            .field("exclusions_file", &self.exclusions_file)
            .field("aql_spec", &self.aql_spec)
            .field("dry_run", &self.dry_run)
            .field("threads", &self.threads)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Collaborators of a run. The logger and the service are injected so tests
/// can substitute in-memory versions.
pub struct Sweeper {
    service: Arc<dyn ArtifactService>,
    logger: LoggerHandle,
    session: RunSession,
    shutdown: ShutdownSignal,
}

impl Sweeper {
    pub fn new(service: Arc<dyn ArtifactService>, logger: LoggerHandle, session: RunSession) -> Self {
        Self {
            service,
            logger,
            session,
            shutdown: ShutdownSignal::detached(),
        }
    }

    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Execute the whole run.
    ///
    /// Returns the summary on completion, including interrupted runs (see
    /// [`RunSummary::interrupted`]). With no LOCAL or FEDERATED repositories
    /// the run ends early and no report is written.
    pub fn run(&self, request: &SweepRequest) -> Result<RunSummary> {
        let log = &self.logger;

        self.configure(request)?;
        let exclusions = self.load_exclusions(&request.exclusions_file)?;
        self.check_query_spec(&request.aql_spec)?;

        log.info("Fetching repository configurations...");
        let repos = list_repositories(self.service.as_ref()).map_err(|e| {
            log.error(format!("Failed to fetch repositories: {e}"));
            e
        })?;

        let mut summary = RunSummary::default();
        if repos.is_empty() {
            log.info("No LOCAL or FEDERATED repositories found.");
            return Ok(summary);
        }

        log.info("Repositories discovered:");
        log_repository_table(log, &repos);

        let dispatcher = DeleteDispatcher::new(
            Arc::clone(&self.service),
            log.clone(),
            request.dry_run,
            request.threads,
        )
        .with_shutdown(self.shutdown.clone());

        let mut outcomes: Vec<DeleteOutcome> = Vec::new();
        for repo in &repos {
            if self.shutdown.is_raised() {
                log.warn("Interrupted; skipping remaining repositories.");
                break;
            }
            log.info(format!("Processing repository: {repo}"));
            summary.repositories += 1;

            let Some(artifacts) = find_old_artifacts(
                self.service.as_ref(),
                log,
                &request.aql_spec,
                &request.older_than,
                &repo.key,
            ) else {
                summary.failed_queries += 1;
                continue;
            };

            if artifacts.is_empty() {
                log.info(format!("No matching artifacts found in {}.", repo.key));
                continue;
            }

            log.info(format!(
                "{} artifact(s) found in {}. Checking exclusions...",
                artifacts.len(),
                repo.key
            ));
            summary.artifacts_found += artifacts.len();

            let repo_outcomes = dispatcher.process_repository(&repo.key, &artifacts, &exclusions);
            summary.tally(&repo_outcomes);
            outcomes.extend(repo_outcomes);
        }
        summary.interrupted = self.shutdown.is_raised();

        let report_path = request.output_dir.join(self.session.report_file_name());
        write_report(&report_path, &outcomes).map_err(|e| {
            log.error(format!("Failed to write CSV report: {e}"));
            e
        })?;
        log.info(format!("CSV report generated: {}", report_path.display()));
        summary.report_file = Some(report_path);

        log.info(format!("Summary: {summary}"));
        let elapsed = Local::now() - self.session.started_at();
        log.debug(format!("Run took {}s", elapsed.num_seconds()));
        Ok(summary)
    }

    fn configure(&self, request: &SweepRequest) -> Result<()> {
        let log = &self.logger;
        let server_id = self.session.server_id();
        log.info(format!(
            "Configuring JFrog CLI with server ID '{server_id}'..."
        ));
        match self
            .service
            .configure(server_id, &request.artifactory_url, &request.access_token)
        {
            Ok(ConfigureOutcome::AlreadyConfigured) => {
                log.info(format!(
                    "Server '{server_id}' already configured, skipping add."
                ));
                Ok(())
            }
            Ok(ConfigureOutcome::Added) => {
                log.info(format!("Successfully added JFrog CLI server '{server_id}'."));
                log.info(format!("Using '{server_id}' as default server."));
                Ok(())
            }
            Err(e) => {
                log.error(format!("Failed to configure JFrog CLI: {e}"));
                Err(e)
            }
        }
    }

    fn load_exclusions(&self, path: &Path) -> Result<ExclusionSet> {
        let log = &self.logger;
        match ExclusionSet::load(path) {
            Ok(set) => {
                log.info(format!(
                    "Loaded {} exclusion patterns from {}",
                    set.len(),
                    path.display()
                ));
                for pattern in set.patterns() {
                    log.debug(format!("exclusion pattern: {pattern}"));
                }
                Ok(set)
            }
            Err(e @ AswError::MissingExclusions { .. }) => {
                log.error(format!("Exclusion file not found: {}", path.display()));
                Err(e)
            }
            Err(e) => {
                log.error(format!("Failed to load exclusions: {e}"));
                Err(e)
            }
        }
    }

    fn check_query_spec(&self, path: &Path) -> Result<()> {
        if path.is_file() {
            return Ok(());
        }
        self.logger
            .error(format!("AQL spec file not found: {}", path.display()));
        Err(AswError::MissingQuerySpec {
            path: path.to_path_buf(),
        })
    }
}
