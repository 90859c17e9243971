//! Port over the external artifact-management service, plus an in-memory
//! implementation for deterministic tests.

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::errors::{AswError, Result};

/// What `configure` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureOutcome {
    /// The server id was already known to the tool; nothing was added.
    AlreadyConfigured,
    /// The server id was added and selected as default.
    Added,
}

/// Narrow surface of the external tool used by a sweep.
///
/// Query methods return the tool's raw stdout; interpreting it is the
/// caller's job so that tolerant parsing lives in one place.
pub trait ArtifactService: Send + Sync {
    /// Register `server_id` for `url`/`access_token` and make it the default.
    fn configure(&self, server_id: &str, url: &str, access_token: &str)
    -> Result<ConfigureOutcome>;

    /// Raw JSON of the repository-configuration endpoint.
    fn list_repositories(&self) -> Result<String>;

    /// Raw JSON of a spec-file search with `timeframe` and `repo` substituted.
    fn search(&self, spec: &Path, timeframe: &str, repo: &str) -> Result<String>;

    /// Delete one artifact. In dry-run mode nothing is mutated.
    fn delete(&self, path: &str, dry_run: bool) -> Result<()>;

    /// Human-readable command line of the delete, for the audit log.
    fn delete_command_line(&self, path: &str, dry_run: bool) -> String {
        format!("jf {}", delete_args(path, dry_run).join(" "))
    }
}

/// Arguments of a delete invocation (without the binary name).
pub fn delete_args(path: &str, dry_run: bool) -> Vec<String> {
    let mut args = vec![
        "rt".to_string(),
        "del".to_string(),
        path.to_string(),
        "--quiet".to_string(),
    ];
    if dry_run {
        args.push("--dry-run".to_string());
    }
    args
}

// ──────────────────── mock ────────────────────

/// In-memory mock implementation for deterministic tests.
///
/// Searches are keyed by repository; an unknown repository returns `[]`.
/// Deletes succeed unless the path was registered as failing or panicking.
#[derive(Debug, Default)]
pub struct MockArtifactService {
    configure_error: Option<String>,
    already_configured: bool,
    repositories: Option<String>,
    repositories_error: Option<String>,
    searches: HashMap<String, std::result::Result<String, String>>,
    delete_failures: HashMap<String, String>,
    delete_panics: HashSet<String>,
    delete_delay: Option<Duration>,
    deletes: Mutex<Vec<(String, bool)>>,
    searched: Mutex<Vec<(String, String)>>,
    configured: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockArtifactService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository-configuration response body.
    #[must_use]
    pub fn with_repositories(mut self, body: impl Into<String>) -> Self {
        self.repositories = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_repositories_error(mut self, message: impl Into<String>) -> Self {
        self.repositories_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_configure_error(mut self, message: impl Into<String>) -> Self {
        self.configure_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn already_configured(mut self) -> Self {
        self.already_configured = true;
        self
    }

    /// Search response body for `repo`.
    #[must_use]
    pub fn with_search(mut self, repo: &str, body: impl Into<String>) -> Self {
        self.searches.insert(repo.to_string(), Ok(body.into()));
        self
    }

    /// Make the search for `repo` fail with `stderr`.
    #[must_use]
    pub fn with_search_error(mut self, repo: &str, stderr: impl Into<String>) -> Self {
        self.searches.insert(repo.to_string(), Err(stderr.into()));
        self
    }

    #[must_use]
    pub fn with_delete_failure(mut self, path: &str, stderr: impl Into<String>) -> Self {
        self.delete_failures.insert(path.to_string(), stderr.into());
        self
    }

    #[must_use]
    pub fn with_delete_panic(mut self, path: &str) -> Self {
        self.delete_panics.insert(path.to_string());
        self
    }

    /// Sleep this long inside every delete (to exercise concurrency).
    #[must_use]
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    /// Every delete call so far as `(path, dry_run)`, in call order.
    pub fn deletes(&self) -> Vec<(String, bool)> {
        self.deletes.lock().clone()
    }

    /// Every search so far as `(repo, timeframe)`.
    pub fn searches(&self) -> Vec<(String, String)> {
        self.searched.lock().clone()
    }

    /// Server ids passed to `configure`.
    pub fn configured(&self) -> Vec<String> {
        self.configured.lock().clone()
    }

    /// Highest number of deletes observed running at the same time.
    pub fn max_concurrent_deletes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ArtifactService for MockArtifactService {
    fn configure(
        &self,
        server_id: &str,
        _url: &str,
        _access_token: &str,
    ) -> Result<ConfigureOutcome> {
        self.configured.lock().push(server_id.to_string());
        if let Some(message) = &self.configure_error {
            return Err(AswError::ToolFailed {
                command: format!("jf config add {server_id}"),
                details: message.clone(),
            });
        }
        if self.already_configured {
            Ok(ConfigureOutcome::AlreadyConfigured)
        } else {
            Ok(ConfigureOutcome::Added)
        }
    }

    fn list_repositories(&self) -> Result<String> {
        if let Some(message) = &self.repositories_error {
            return Err(AswError::ToolFailed {
                command: "jf rt curl -XGET /api/repositories/configurations".to_string(),
                details: message.clone(),
            });
        }
        Ok(self.repositories.clone().unwrap_or_else(|| "{}".to_string()))
    }

    fn search(&self, _spec: &Path, timeframe: &str, repo: &str) -> Result<String> {
        self.searched
            .lock()
            .push((repo.to_string(), timeframe.to_string()));
        match self.searches.get(repo) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(stderr)) => Err(AswError::ToolFailed {
                command: "jf rt search".to_string(),
                details: stderr.clone(),
            }),
            None => Ok("[]".to_string()),
        }
    }

    fn delete(&self, path: &str, dry_run: bool) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delete_delay {
            std::thread::sleep(delay);
        }
        self.deletes.lock().push((path.to_string(), dry_run));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        assert!(
            !self.delete_panics.contains(path),
            "mock delete panicked for {path}"
        );
        if let Some(stderr) = self.delete_failures.get(path) {
            return Err(AswError::ToolFailed {
                command: self.delete_command_line(path, dry_run),
                details: stderr.clone(),
            });
        }
        Ok(())
    }
}
