//! Domain model for release lifecycle orchestration.
//!
//! Release identifiers, descriptors, per-module version arithmetic and the
//! outcome types shared by the pipeline and the task executors. Nothing here
//! touches the filesystem, processes or queues.

mod descriptor;
mod environment;
mod error;
mod ids;
mod outcome;
mod project;
mod properties;
mod version;

pub use descriptor::{DEFAULT_MANIFEST_FILE_NAME, LOCAL_REPOSITORY_PROPERTY, ReleaseDescriptor};
pub use environment::{ReleaseEnvironment, ToolSettings};
pub use error::{ParseReleaseValueError, ReleaseDomainError};
pub use ids::{ModuleKey, ReleaseId, TaskRunId};
pub use outcome::{ReleaseOperation, ReleaseOutcome, ReleaseResult, ReleaseStatus};
pub use project::{ProjectDescriptor, ReactorProject};
pub use properties::ReleaseProperties;
pub use version::{SNAPSHOT_SUFFIX, is_snapshot, next_development_version, release_version_of};
