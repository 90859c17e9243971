#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_asweep") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "asweep.exe" } else { "asweep" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve asweep binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_in(case_name, &std::env::temp_dir(), args)
}

/// Run the binary with `home` as `$HOME` and no `ASW_*` overrides, so a
/// developer's own config never leaks into a test.
pub fn run_cli_case_in(case_name: &str, home: &Path, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("asweep-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", home)
        .env("RUST_BACKTRACE", "1");
    for (key, _) in std::env::vars() {
        if key.starts_with("ASW_") {
            command.env_remove(key);
        }
    }
    let output = command.output().expect("execute asweep command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Exclusions file plus query spec inside `dir`.
pub struct SweepInputs {
    pub exclusions_file: PathBuf,
    pub aql_spec: PathBuf,
}

pub fn write_inputs(dir: &Path, exclusions_json: &str) -> SweepInputs {
    let exclusions_file = dir.join("exclusions.json");
    fs::write(&exclusions_file, exclusions_json).expect("write exclusions");
    let aql_spec = dir.join("old-artifacts.spec");
    fs::write(
        &aql_spec,
        r#"{"files": [{"aql": {"items.find": {"repo": "${repo}", "created": {"$before": "${timeframe}"}}}}]}"#,
    )
    .expect("write aql spec");
    SweepInputs {
        exclusions_file,
        aql_spec,
    }
}

/// Write an executable shell script standing in for `jf`. Every invocation
/// appends its arguments to `calls.log` next to the script.
#[cfg(unix)]
pub fn fake_jf(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("jf");
    let calls = dir.join("calls.log");
    fs::write(
        &path,
        format!("#!/bin/sh\necho \"$@\" >> '{}'\n{body}\n", calls.display()),
    )
    .expect("write fake jf");
    let mut perms = fs::metadata(&path).expect("stat fake jf").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake jf");
    path
}

/// Every file in `dir` with the given extension.
pub fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    found.sort();
    found
}
