//! ASW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, AswError>;

/// Top-level error type for artifact sweeper.
#[derive(Debug, Error)]
pub enum AswError {
    #[error("[ASW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ASW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ASW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ASW-1101] exclusion file not found: {path}")]
    MissingExclusions { path: PathBuf },

    #[error("[ASW-1102] AQL spec file not found: {path}")]
    MissingQuerySpec { path: PathBuf },

    #[error("[ASW-1103] invalid exclusion pattern {pattern:?}: {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error("[ASW-2001] external tool `{command}` failed: {details}")]
    ToolFailed { command: String, details: String },

    #[error("[ASW-2002] external tool `{command}` timed out after {seconds}s")]
    ToolTimeout { command: String, seconds: u64 },

    #[error("[ASW-2003] unexpected response from {context}: {details}")]
    UnexpectedResponse {
        context: &'static str,
        details: String,
    },

    #[error("[ASW-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ASW-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ASW-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl AswError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ASW-1001",
            Self::MissingConfig { .. } => "ASW-1002",
            Self::ConfigParse { .. } => "ASW-1003",
            Self::MissingExclusions { .. } => "ASW-1101",
            Self::MissingQuerySpec { .. } => "ASW-1102",
            Self::InvalidPattern { .. } => "ASW-1103",
            Self::ToolFailed { .. } => "ASW-2001",
            Self::ToolTimeout { .. } => "ASW-2002",
            Self::UnexpectedResponse { .. } => "ASW-2003",
            Self::Serialization { .. } => "ASW-2101",
            Self::Io { .. } => "ASW-3002",
            Self::Runtime { .. } => "ASW-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ToolFailed { .. }
                | Self::ToolTimeout { .. }
                | Self::Io { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Text suitable for the report's `Error` column: the tool's own message
    /// without the ASW code prefix.
    #[must_use]
    pub fn report_message(&self) -> String {
        match self {
            Self::ToolFailed { details, .. } => details.clone(),
            Self::ToolTimeout { seconds, .. } => format!("timed out after {seconds}s"),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for AswError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<csv::Error> for AswError {
    fn from(value: csv::Error) -> Self {
        Self::Serialization {
            context: "csv",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for AswError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_variant() -> Vec<AswError> {
        vec![
            AswError::InvalidConfig {
                details: String::new(),
            },
            AswError::MissingConfig {
                path: PathBuf::new(),
            },
            AswError::ConfigParse {
                context: "",
                details: String::new(),
            },
            AswError::MissingExclusions {
                path: PathBuf::new(),
            },
            AswError::MissingQuerySpec {
                path: PathBuf::new(),
            },
            AswError::InvalidPattern {
                pattern: String::new(),
                details: String::new(),
            },
            AswError::ToolFailed {
                command: String::new(),
                details: String::new(),
            },
            AswError::ToolTimeout {
                command: String::new(),
                seconds: 0,
            },
            AswError::UnexpectedResponse {
                context: "",
                details: String::new(),
            },
            AswError::Serialization {
                context: "",
                details: String::new(),
            },
            AswError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            AswError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = every_variant();
        let codes: Vec<&str> = errors.iter().map(AswError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_asw_prefix() {
        for err in &every_variant() {
            assert!(
                err.code().starts_with("ASW-"),
                "code {} must start with ASW-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = AswError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ASW-1001"), "display should contain code: {msg}");
        assert!(msg.contains("bad value"), "display should contain details: {msg}");
    }

    #[test]
    fn tool_errors_are_retryable_config_errors_are_not() {
        assert!(
            AswError::ToolFailed {
                command: "jf rt del".to_string(),
                details: "503".to_string(),
            }
            .is_retryable()
        );
        assert!(
            AswError::ToolTimeout {
                command: "jf rt del".to_string(),
                seconds: 5,
            }
            .is_retryable()
        );
        assert!(
            !AswError::MissingExclusions {
                path: PathBuf::new()
            }
            .is_retryable()
        );
        assert!(!AswError::InvalidConfig { details: String::new() }.is_retryable());
    }

    #[test]
    fn report_message_strips_code_for_tool_failures() {
        let err = AswError::ToolFailed {
            command: "jf rt del a/b.zip --quiet".to_string(),
            details: "[Error] 403 Forbidden".to_string(),
        };
        assert_eq!(err.report_message(), "[Error] 403 Forbidden");

        let timeout = AswError::ToolTimeout {
            command: "jf rt del a/b.zip --quiet".to_string(),
            seconds: 30,
        };
        assert_eq!(timeout.report_message(), "timed out after 30s");
    }

    #[test]
    fn io_convenience_constructor() {
        let err = AswError::io(
            "/tmp/report.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "ASW-3002");
        assert!(err.to_string().contains("/tmp/report.csv"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: AswError = json_err.into();
        assert_eq!(err.code(), "ASW-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: AswError = toml_err.into();
        assert_eq!(err.code(), "ASW-1003");
    }
}
