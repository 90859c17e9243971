//! Delete dispatcher: exclusion filter plus a bounded worker pool.
//!
//! Pipeline per repository: candidates -> exclusion check (skips recorded
//! inline) -> job channel -> `concurrency` scoped workers -> result channel
//! drained in completion order.
//!
//! Every candidate yields exactly one outcome. A panic anywhere in a job is
//! caught inside the worker loop and recorded as an error, so the worker
//! keeps draining jobs; a job whose result never arrives is detected after
//! the pool is torn down and recorded as an error too.

#![allow(missing_docs)]

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;

use crate::core::signals::ShutdownSignal;
use crate::logger::LoggerHandle;
use crate::platform::ArtifactService;
use crate::report::DeleteOutcome;
use crate::sweep::exclusions::ExclusionSet;
use crate::sweep::finder::ArtifactRecord;

/// Error text for artifacts never attempted because the run was interrupted.
pub const CANCELLED: &str = "cancelled before deletion";

/// Error text for a search entry that carried no path.
pub const MISSING_PATH: &str = "artifact record has no path";

const LOST_RESULT: &str = "worker exited without reporting a result";

/// Runs the deletes for one repository at a time.
pub struct DeleteDispatcher {
    service: Arc<dyn ArtifactService>,
    logger: LoggerHandle,
    dry_run: bool,
    concurrency: usize,
    shutdown: ShutdownSignal,
}

impl DeleteDispatcher {
    pub fn new(
        service: Arc<dyn ArtifactService>,
        logger: LoggerHandle,
        dry_run: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            service,
            logger,
            dry_run,
            concurrency: concurrency.max(1),
            shutdown: ShutdownSignal::detached(),
        }
    }

    /// Stop picking up new deletes once `shutdown` is raised.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Filter `artifacts` through `exclusions` and delete the rest.
    ///
    /// Skips come first in input order; delete outcomes follow in completion
    /// order. The pool lives only for the duration of this call.
    pub fn process_repository(
        &self,
        repository: &str,
        artifacts: &[ArtifactRecord],
        exclusions: &ExclusionSet,
    ) -> Vec<DeleteOutcome> {
        let mut outcomes = Vec::with_capacity(artifacts.len());
        let mut pending: Vec<&str> = Vec::new();

        for artifact in artifacts {
            let matched = exclusions.is_excluded(&artifact.path);
            if matched.is_excluded() {
                self.logger
                    .info(format!("[SKIP] Excluded by pattern: {}", artifact.path));
                outcomes.push(DeleteOutcome::skipped(
                    repository,
                    &artifact.path,
                    matched.joined(),
                ));
            } else {
                pending.push(&artifact.path);
            }
        }

        if !pending.is_empty() {
            self.run_pool(repository, &pending, &mut outcomes);
        }
        outcomes
    }

    fn run_pool(&self, repository: &str, pending: &[&str], outcomes: &mut Vec<DeleteOutcome>) {
        let (job_tx, job_rx) = unbounded::<usize>();
        for index in 0..pending.len() {
            let _ = job_tx.send(index);
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<(usize, DeleteOutcome)>();
        let mut reported = vec![false; pending.len()];
        let workers = self.concurrency.min(pending.len());

        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("asweep-delete-{worker}"))
                    .spawn_scoped(scope, move || {
                        while let Ok(index) = job_rx.recv() {
                            let outcome = self.guarded_attempt(repository, pending[index]);
                            if result_tx.send((index, outcome)).is_err() {
                                break;
                            }
                        }
                    });
                if let Err(e) = spawned {
                    self.logger
                        .error(format!("Failed to start delete worker {worker}: {e}"));
                }
            }
            drop(result_tx);

            for (index, outcome) in &result_rx {
                reported[index] = true;
                outcomes.push(outcome);
            }
        });

        for (index, path) in pending.iter().enumerate() {
            if !reported[index] {
                self.logger.error(format!(
                    "Unexpected error while deleting {path}: {LOST_RESULT}"
                ));
                outcomes.push(DeleteOutcome::error(repository, *path, LOST_RESULT));
            }
        }
    }

    /// One delete attempt; a panic in any part of it becomes an error outcome.
    fn guarded_attempt(&self, repository: &str, path: &str) -> DeleteOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.attempt(repository, path))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.logger
                    .error(format!("Unexpected error while deleting {path}: {message}"));
                DeleteOutcome::error(repository, path, message)
            }
        }
    }

    fn attempt(&self, repository: &str, path: &str) -> DeleteOutcome {
        if self.shutdown.is_raised() {
            self.logger.warn(format!("[CANCELLED] {path}"));
            return DeleteOutcome::error(repository, path, CANCELLED);
        }
        if path.is_empty() {
            self.logger
                .error(format!("[ERROR] Delete failed: {MISSING_PATH}"));
            return DeleteOutcome::error(repository, path, MISSING_PATH);
        }

        let command = self.service.delete_command_line(path, self.dry_run);
        match self.service.delete(path, self.dry_run) {
            Ok(()) => {
                let label = if self.dry_run { "DRYRUN-COMPLETE" } else { "DELETED" };
                self.logger.info(format!("[{label}] {command}"));
                DeleteOutcome::deleted(repository, path)
            }
            Err(err) => {
                let message = err.report_message();
                self.logger
                    .error(format!("[ERROR] Delete failed: {command} - {message}"));
                self.logger.debug(format!("delete failure detail: {err}"));
                DeleteOutcome::error(repository, path, message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "delete worker panicked".to_string()
    }
}
