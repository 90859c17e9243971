//! Artifact finder: run the retention query for one repository and parse the
//! response tolerantly.

#![allow(missing_docs)]

use std::path::Path;

use serde_json::{Map, Value};

use crate::logger::LoggerHandle;
use crate::platform::ArtifactService;

/// One candidate returned by the retention query.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRecord {
    /// Path handed to the delete command. Empty when the response entry had
    /// no usable `path`.
    pub path: String,
    /// Every other field of the response entry, untouched.
    pub metadata: Map<String, Value>,
}

impl ArtifactRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: Map::new(),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let path = match fields.remove("path") {
                    Some(Value::String(path)) => path,
                    _ => String::new(),
                };
                Self {
                    path,
                    metadata: fields,
                }
            }
            _ => Self::new(""),
        }
    }
}

/// Run the query for `repo`. `None` means the query itself failed; the
/// failure has been logged and the caller moves on to the next repository.
pub fn find_old_artifacts(
    service: &dyn ArtifactService,
    logger: &LoggerHandle,
    spec: &Path,
    timeframe: &str,
    repo: &str,
) -> Option<Vec<ArtifactRecord>> {
    match service.search(spec, timeframe, repo) {
        Ok(output) => Some(parse_artifacts(&output, logger)),
        Err(err) => {
            logger.error("Search using spec file failed:");
            logger.error(err.report_message());
            logger.debug(format!("search failure detail: {err}"));
            None
        }
    }
}

/// Accept a bare JSON list or an object with a `results` list. Anything
/// else degrades to an empty result with a log line.
pub fn parse_artifacts(output: &str, logger: &LoggerHandle) -> Vec<ArtifactRecord> {
    if output.trim().is_empty() {
        logger.debug("Search returned no output.");
        return Vec::new();
    }

    let data: Value = match serde_json::from_str(output) {
        Ok(data) => data,
        Err(err) => {
            logger.error("Failed to parse search response.");
            logger.debug(format!("search response parse error: {err}"));
            return Vec::new();
        }
    };

    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut envelope) if envelope.contains_key("results") => {
            match envelope.remove("results") {
                Some(Value::Array(items)) => items,
                _ => {
                    logger.warn("Unexpected data format in search output.");
                    return Vec::new();
                }
            }
        }
        _ => {
            logger.warn("Unexpected data format in search output.");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .map(|item| {
            let record = ArtifactRecord::from_value(item);
            if record.path.is_empty() {
                logger.warn("Search result entry without a path.");
            }
            record
        })
        .collect()
}
