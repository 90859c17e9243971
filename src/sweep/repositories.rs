//! Repository enumeration: which repositories hold deletable physical storage.

#![allow(missing_docs)]

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::{AswError, Result};
use crate::platform::ArtifactService;

/// Storage topology of a repository. Only these two classes are swept;
/// remote and virtual repositories hold no physical artifacts of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryClass {
    Local,
    Federated,
}

impl RepositoryClass {
    /// Enumeration order: every LOCAL repository, then every FEDERATED one.
    pub const SWEPT: [Self; 2] = [Self::Local, Self::Federated];

    /// Key of this class in the configurations response.
    pub const fn response_key(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Federated => "FEDERATED",
        }
    }
}

/// A repository selected for sweeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub key: String,
    pub class: RepositoryClass,
    /// `rclass` exactly as reported by the service (e.g. `local`).
    pub rclass: String,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.rclass)
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    key: String,
    rclass: String,
}

/// Fetch every LOCAL and FEDERATED repository.
///
/// Any failure is fatal to the run: without the list there is nothing
/// meaningful to sweep.
pub fn list_repositories(service: &dyn ArtifactService) -> Result<Vec<Repository>> {
    let body = service.list_repositories()?;
    parse_repositories(&body)
}

/// Parse a `{LOCAL: [...], FEDERATED: [...], ...}` configurations body.
pub fn parse_repositories(body: &str) -> Result<Vec<Repository>> {
    let data: Value = serde_json::from_str(body).map_err(|err| AswError::UnexpectedResponse {
        context: "repository configurations",
        details: format!("invalid JSON: {err}"),
    })?;
    let Value::Object(by_class) = data else {
        return Err(AswError::UnexpectedResponse {
            context: "repository configurations",
            details: "expected a JSON object keyed by repository class".to_string(),
        });
    };

    let mut repos = Vec::new();
    for class in RepositoryClass::SWEPT {
        let Some(entries) = by_class.get(class.response_key()) else {
            continue;
        };
        let entries: Vec<RepositoryEntry> =
            serde_json::from_value(entries.clone()).map_err(|err| {
                AswError::UnexpectedResponse {
                    context: "repository configurations",
                    details: format!("{} entries: {err}", class.response_key()),
                }
            })?;
        repos.extend(entries.into_iter().map(|entry| Repository {
            key: entry.key,
            class,
            rclass: entry.rclass,
        }));
    }
    Ok(repos)
}
