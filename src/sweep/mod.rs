//! Sweep engine: exclusion matching, repository enumeration, artifact search,
//! parallel deletion, and the run pipeline tying them together.

pub mod dispatcher;
pub mod exclusions;
pub mod finder;
pub mod pipeline;
pub mod repositories;

pub use dispatcher::DeleteDispatcher;
pub use exclusions::{ExclusionMatch, ExclusionSet};
pub use finder::{ArtifactRecord, find_old_artifacts, parse_artifacts};
pub use pipeline::{SweepRequest, Sweeper};
pub use repositories::{Repository, RepositoryClass, list_repositories};
