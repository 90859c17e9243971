//! `jf` (JFrog CLI) process adapter.
//!
//! Every operation is a child-process invocation. Deletes may be bounded by a
//! timeout: the child's pipes are drained on helper threads while the caller
//! polls for exit, and an overdue child is killed.

#![allow(missing_docs)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::errors::{AswError, Result};
use crate::platform::service::{ArtifactService, ConfigureOutcome, delete_args};

/// Poll interval while waiting on a child with a deadline.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
struct ProcessOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// JFrog CLI adapter.
#[derive(Debug, Clone)]
pub struct JfrogCli {
    binary: PathBuf,
    delete_timeout: Option<Duration>,
}

impl JfrogCli {
    /// Adapter for `binary`; `delete_timeout` of `None` waits forever.
    pub fn new(binary: impl Into<PathBuf>, delete_timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            delete_timeout,
        }
    }

    fn display(&self, args: &[String]) -> String {
        format!("{} {}", self.binary.display(), args.join(" "))
    }

    fn run(&self, args: &[String], timeout: Option<Duration>) -> Result<ProcessOutput> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AswError::ToolFailed {
                command: self.display(args),
                details: format!("failed to start {}: {e}", self.binary.display()),
            })?;
        wait_with_deadline(child, timeout).map_err(|err| match err {
            WaitError::TimedOut => AswError::ToolTimeout {
                command: self.display(args),
                seconds: timeout.map_or(0, |t| t.as_secs()),
            },
            WaitError::Io(e) => AswError::ToolFailed {
                command: self.display(args),
                details: e.to_string(),
            },
        })
    }

    /// Run and require a zero exit status; stderr becomes the error detail.
    fn run_checked(&self, args: &[String], timeout: Option<Duration>) -> Result<String> {
        self.run_checked_as(args, &self.display(args), timeout)
    }

    /// Like [`Self::run_checked`] but reports `shown` as the command, for
    /// argument lists that carry secrets.
    fn run_checked_as(
        &self,
        args: &[String],
        shown: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let output = self.run(args, timeout).map_err(|err| match err {
            AswError::ToolFailed { details, .. } => AswError::ToolFailed {
                command: shown.to_string(),
                details,
            },
            AswError::ToolTimeout { seconds, .. } => AswError::ToolTimeout {
                command: shown.to_string(),
                seconds,
            },
            other => other,
        })?;
        if output.success {
            return Ok(output.stdout);
        }
        let stderr = output.stderr.trim();
        if stderr.is_empty() {
            // Exit code goes into the command text, not the report column.
            return Err(AswError::ToolFailed {
                command: format!("{shown} (exit {})", output.code.unwrap_or(-1)),
                details: "Unknown error".to_string(),
            });
        }
        Err(AswError::ToolFailed {
            command: shown.to_string(),
            details: stderr.to_string(),
        })
    }
}

impl ArtifactService for JfrogCli {
    fn configure(
        &self,
        server_id: &str,
        url: &str,
        access_token: &str,
    ) -> Result<ConfigureOutcome> {
        // A failing `config show` just means nothing is configured yet.
        if let Ok(shown) = self.run_checked(&strings(&["config", "show"]), None)
            && shown.contains(server_id)
        {
            return Ok(ConfigureOutcome::AlreadyConfigured);
        }

        let add = strings(&[
            "config",
            "add",
            server_id,
            "--url",
            url,
            "--access-token",
            access_token,
            "--interactive=false",
        ]);
        let redacted = format!(
            "{} config add {server_id} --url {url} --access-token *** --interactive=false",
            self.binary.display()
        );
        self.run_checked_as(&add, &redacted, None)?;
        self.run_checked(&strings(&["config", "use", server_id]), None)?;
        Ok(ConfigureOutcome::Added)
    }

    fn list_repositories(&self) -> Result<String> {
        self.run_checked(
            &strings(&["rt", "curl", "-XGET", "/api/repositories/configurations"]),
            None,
        )
    }

    fn search(&self, spec: &Path, timeframe: &str, repo: &str) -> Result<String> {
        let spec_vars = format!("timeframe={timeframe};repo={repo}");
        let args = vec![
            "rt".to_string(),
            "search".to_string(),
            "--spec".to_string(),
            spec.to_string_lossy().into_owned(),
            "--spec-vars".to_string(),
            spec_vars,
        ];
        self.run_checked(&args, None)
    }

    fn delete(&self, path: &str, dry_run: bool) -> Result<()> {
        self.run_checked(&delete_args(path, dry_run), self.delete_timeout)
            .map(|_| ())
    }

    fn delete_command_line(&self, path: &str, dry_run: bool) -> String {
        self.display(&delete_args(path, dry_run))
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_string()).collect()
}

// ──────────────────── process waiting ────────────────────

#[derive(Debug)]
enum WaitError {
    TimedOut,
    Io(std::io::Error),
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait_with_deadline(
    mut child: Child,
    timeout: Option<Duration>,
) -> std::result::Result<ProcessOutput, WaitError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => child.wait().map_err(WaitError::Io)?,
        Some(limit) => {
            let deadline = Instant::now() + limit;
            loop {
                if let Some(status) = child.try_wait().map_err(WaitError::Io)? {
                    break status;
                }
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Grandchildren may still hold the pipes open; leave the
                    // drain threads detached.
                    return Err(WaitError::TimedOut);
                }
                thread::sleep(WAIT_POLL);
            }
        }
    };

    Ok(ProcessOutput {
        success: status.success(),
        code: status.code(),
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script standing in for `jf`.
    fn fake_jf(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("jf");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn search_passes_spec_vars_and_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let jf = fake_jf(dir.path(), r#"echo "$@""#);
        let cli = JfrogCli::new(jf, None);

        let out = cli
            .search(Path::new("/specs/old.json"), "90d", "builds-local")
            .unwrap();
        assert_eq!(
            out.trim(),
            "rt search --spec /specs/old.json --spec-vars timeframe=90d;repo=builds-local"
        );
    }

    #[test]
    fn failing_delete_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let jf = fake_jf(dir.path(), "echo 'permission denied' >&2\nexit 1");
        let cli = JfrogCli::new(jf, None);

        let err = cli.delete("libs/a.jar", false).unwrap_err();
        assert_eq!(err.report_message(), "permission denied");
        assert!(err.to_string().contains("rt del libs/a.jar --quiet"));
    }

    #[test]
    fn silent_failure_reports_unknown_error() {
        let dir = tempfile::tempdir().unwrap();
        let jf = fake_jf(dir.path(), "exit 3");
        let cli = JfrogCli::new(jf, None);

        let err = cli.delete("libs/a.jar", true).unwrap_err();
        assert_eq!(err.report_message(), "Unknown error");
        assert!(err.to_string().contains("(exit 3)"), "{err}");
    }

    #[test]
    fn hung_delete_is_killed_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let jf = fake_jf(dir.path(), "exec sleep 30");
        let cli = JfrogCli::new(jf, Some(Duration::from_millis(200)));

        let start = Instant::now();
        let err = cli.delete("libs/a.jar", false).unwrap_err();
        assert!(matches!(err, AswError::ToolTimeout { .. }), "got {err}");
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn missing_binary_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cli = JfrogCli::new(dir.path().join("no-such-jf"), None);
        let err = cli.list_repositories().unwrap_err();
        assert_eq!(err.code(), "ASW-2001");
    }

    #[test]
    fn configure_skips_add_when_server_already_listed() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let jf = fake_jf(
            dir.path(),
            &format!(
                "echo \"$@\" >> {}\nif [ \"$2\" = show ]; then echo 'Server ID: cli-config-abc'; fi",
                log.display()
            ),
        );
        let cli = JfrogCli::new(jf, None);

        let outcome = cli.configure("cli-config-abc", "https://x", "secret").unwrap();
        assert_eq!(outcome, ConfigureOutcome::AlreadyConfigured);
        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.lines().count(), 1);
    }

    #[test]
    fn configure_adds_then_uses_server() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let jf = fake_jf(dir.path(), &format!("echo \"$@\" >> {}", log.display()));
        let cli = JfrogCli::new(jf, None);

        let outcome = cli.configure("cli-config-new", "https://x", "secret").unwrap();
        assert_eq!(outcome, ConfigureOutcome::Added);
        let calls = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("config add cli-config-new --url https://x"));
        assert_eq!(lines[2], "config use cli-config-new");
    }

    #[test]
    fn configure_failure_redacts_token() {
        let dir = tempfile::tempdir().unwrap();
        let jf = fake_jf(
            dir.path(),
            "if [ \"$2\" = add ]; then echo 'bad url' >&2; exit 1; fi",
        );
        let cli = JfrogCli::new(jf, None);

        let err = cli.configure("cli-config-x", "nope", "s3cr3t").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("bad url"));
        assert!(!text.contains("s3cr3t"), "token leaked: {text}");
    }
}
