//! External artifact-service access: the [`ArtifactService`] port, the `jf`
//! process adapter, and an in-memory mock.

pub mod jfrog;
pub mod service;

pub use jfrog::JfrogCli;
pub use service::{ArtifactService, ConfigureOutcome, MockArtifactService};
