//! Port contracts for the release lifecycle.
//!
//! The executors drive a [`ReleaseEngine`]; the provided pipeline engine in
//! turn reaches source control, the build tool, manifests and persisted
//! descriptors only through the traits defined here.

pub mod engine;
pub mod goals;
pub mod listener;
pub mod manifests;
pub mod scm;
pub mod settings;
pub mod store;

pub use engine::{ReleaseEngine, ReleaseEngineError, ReleaseEngineResult};
pub use goals::{GoalExecutor, GoalExecutorError, GoalExecutorResult, GoalRequest};
pub use listener::ReleaseListener;
pub use manifests::{BACKUP_SUFFIX, ManifestError, ManifestResult, ProjectManifests};
pub use scm::{CheckoutRequest, ScmClient, ScmCredentials, ScmError, ScmResult};
pub use settings::{SettingsError, SettingsResult, SettingsSource};
pub use store::{DescriptorStore, DescriptorStoreError, DescriptorStoreResult};
