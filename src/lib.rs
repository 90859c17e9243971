#![forbid(unsafe_code)]

//! Artifact Sweeper (asweep): retention-based cleanup of Artifactory
//! repositories through the JFrog CLI.
//!
//! A run configures `jf`, lists every LOCAL and FEDERATED repository, queries
//! each for artifacts older than a retention window, filters the hits through
//! glob exclusions, and deletes the rest on a bounded worker pool. Every
//! artifact ends up as one row of a `;`-delimited CSV report.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use artifact_sweeper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use artifact_sweeper::core::config::Config;
//! use artifact_sweeper::sweep::exclusions::ExclusionSet;
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod platform;
pub mod report;
pub mod sweep;
