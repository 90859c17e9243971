//! Exclusion patterns: shell-style globs that protect artifact paths from deletion.
//!
//! Patterns are matched against the whole artifact path exactly as received,
//! with no separator or case normalization:
//! - `*` matches any run of characters, `/` included
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from the class; `[!abc]` negates
//! - a `[` without a closing `]` is a literal bracket
//!
//! Every pattern is evaluated so the report can name all of them, not just
//! the first hit.

#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::core::errors::{AswError, Result};

/// On-disk shape of the exclusions file.
#[derive(Debug, Deserialize)]
struct ExclusionFile {
    #[serde(default)]
    exclude: Vec<String>,
}

/// Compiled glob pattern for path matching.
#[derive(Debug, Clone)]
struct GlobPattern {
    original: String,
    compiled: Regex,
}

/// Result of testing one path against every pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionMatch {
    matched: Vec<String>,
}

impl ExclusionMatch {
    /// Whether at least one pattern matched.
    pub fn is_excluded(&self) -> bool {
        !self.matched.is_empty()
    }

    /// All matching patterns, deduplicated, in file order.
    pub fn matched_patterns(&self) -> &[String] {
        &self.matched
    }

    /// Matching patterns joined for display (`", "`).
    pub fn joined(&self) -> String {
        self.matched.join(", ")
    }
}

/// The loaded, read-only set of exclusion patterns for a run.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<GlobPattern>,
}

impl ExclusionSet {
    /// Compile `patterns`. Fails on the first pattern that cannot be compiled.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pat| {
                let pat = pat.as_ref();
                Ok(GlobPattern {
                    original: pat.to_string(),
                    compiled: glob_to_regex(pat)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns: compiled })
    }

    /// Load `{"exclude": [...]}` from `path`. A missing `exclude` key means
    /// no patterns; a missing file or invalid JSON is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AswError::MissingExclusions {
                    path: path.to_path_buf(),
                }
            } else {
                AswError::io(path, source)
            }
        })?;
        let file: ExclusionFile =
            serde_json::from_str(&raw).map_err(|err| AswError::ConfigParse {
                context: "exclusions file",
                details: format!("{}: {err}", path.display()),
            })?;
        Self::new(&file.exclude)
    }

    /// Test `path` against every pattern.
    pub fn is_excluded(&self, path: &str) -> ExclusionMatch {
        let mut matched: Vec<String> = Vec::new();
        for pattern in &self.patterns {
            if pattern.compiled.is_match(path) && !matched.contains(&pattern.original) {
                matched.push(pattern.original.clone());
            }
        }
        ExclusionMatch { matched }
    }

    /// Number of patterns (duplicates included).
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The original pattern strings, in file order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.original.as_str())
    }
}

/// Convert a shell-style glob pattern to an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex_str = String::with_capacity(pattern.len() * 2 + 8);
    regex_str.push_str(r"\A(?s:");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Runs of `*` are equivalent to one.
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                regex_str.push_str(".*");
            }
            '?' => {
                regex_str.push('.');
                i += 1;
            }
            '[' => match class_end(&chars, i + 1) {
                Some(end) => {
                    regex_str.push_str(&class_to_regex(&chars[i + 1..end]));
                    i = end + 1;
                }
                None => {
                    regex_str.push_str(r"\[");
                    i += 1;
                }
            },
            c => {
                regex_str.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
                i += 1;
            }
        }
    }

    regex_str.push_str(r")\z");

    Regex::new(&regex_str).map_err(|err| AswError::InvalidPattern {
        pattern: pattern.to_string(),
        details: err.to_string(),
    })
}

/// Index of the `]` closing a class that opens just before `start`.
///
/// A `]` directly after the opening bracket (or after `!`) is a member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

/// Translate the members of a bracket expression (without the brackets).
fn class_to_regex(body: &[char]) -> String {
    let (negated, members) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut out = String::new();
    let mut k = 0;
    while k < members.len() {
        let lo = members[k];
        if k + 2 < members.len() && members[k + 1] == '-' {
            let hi = members[k + 2];
            // Reversed ranges are empty.
            if lo <= hi {
                out.push_str(&escape_class_char(lo));
                out.push('-');
                out.push_str(&escape_class_char(hi));
            }
            k += 3;
        } else {
            out.push_str(&escape_class_char(lo));
            k += 1;
        }
    }

    match (negated, out.is_empty()) {
        // `[!]` style: every member dropped, so any character matches.
        (true, true) => ".".to_string(),
        // Nothing can match.
        (false, true) => r"\b\B".to_string(),
        (true, false) => format!("[^{out}]"),
        (false, false) => format!("[{out}]"),
    }
}

fn escape_class_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}
