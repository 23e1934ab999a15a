//! In-memory adapter implementations.
//!
//! These adapters keep release flows deterministic for tests and dry runs.
//! The SCM client still materialises checkouts on disk so manifest phases
//! can operate on real files.

mod descriptor_store;
mod goals;
mod listener;
mod scm;

pub use descriptor_store::InMemoryDescriptorStore;
pub use goals::InMemoryGoalExecutor;
pub use listener::{ListenerEvent, RecordingReleaseListener};
pub use scm::{InMemoryScmClient, RecordedCommit};
