//! Configuration system: optional TOML file + env var overrides + smart defaults.
//!
//! Precedence, lowest to highest: built-in defaults, config file, `ASW_*`
//! environment variables, command-line flags (applied by the CLI layer).

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{AswError, Result};

/// Default number of parallel delete workers per repository.
pub const DEFAULT_THREADS: usize = 4;

/// Default upper bound for a single external delete invocation.
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 300;

/// Full sweeper configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub tool: ToolConfig,
    pub cleanup: CleanupConfig,
    pub output: OutputConfig,
    /// Where this config was loaded from (not serialized back).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// External `jf` client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// Path or name of the JFrog CLI binary.
    pub jf_binary: PathBuf,
    /// Seconds before a delete invocation is killed. `0` disables the bound.
    pub delete_timeout_secs: u64,
    /// Prefix for the per-run server id registered with `jf config add`.
    pub server_id_prefix: String,
}

/// Deletion behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanupConfig {
    pub threads: usize,
    pub dry_run: bool,
}

/// Where run artifacts (log + CSV report) are written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            jf_binary: PathBuf::from("jf"),
            delete_timeout_secs: DEFAULT_DELETE_TIMEOUT_SECS,
            server_id_prefix: "cli-config".to_string(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            dry_run: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Default configuration path (`~/.config/asweep/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("asweep").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |name| env::var(name).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| AswError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let mut parsed: Self = toml::from_str(&raw)?;
            parsed.source = Some(path_buf);
            parsed
        } else if is_explicit_path {
            return Err(AswError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("ASW_JF_BINARY") {
            self.tool.jf_binary = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("ASW_DELETE_TIMEOUT_SECS") {
            self.tool.delete_timeout_secs = parse_env_u64("ASW_DELETE_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("ASW_THREADS") {
            self.cleanup.threads = parse_env_usize("ASW_THREADS", &raw)?;
        }
        if let Some(raw) = lookup("ASW_DRY_RUN") {
            self.cleanup.dry_run = parse_env_bool("ASW_DRY_RUN", &raw)?;
        }
        if let Some(raw) = lookup("ASW_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Check invariants. Called after every layer has been applied.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup.threads == 0 {
            return Err(AswError::InvalidConfig {
                details: "cleanup.threads must be >= 1".to_string(),
            });
        }
        if self.tool.jf_binary.as_os_str().is_empty() {
            return Err(AswError::InvalidConfig {
                details: "tool.jf_binary must not be empty".to_string(),
            });
        }
        if self.tool.server_id_prefix.trim().is_empty() {
            return Err(AswError::InvalidConfig {
                details: "tool.server_id_prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|error| AswError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|error| AswError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| AswError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
