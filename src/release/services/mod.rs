//! Application services for release orchestration.
//!
//! [`ReleaseManager`] admits tasks into three FIFO [`TaskQueue`]s; one
//! worker per queue ([`spawn_release_workers`]) hands each task to a
//! [`ReleaseTaskExecutor`], which publishes the outcome into the shared
//! [`ReleaseState`].

mod executor;
mod manager;
mod queue;
mod state;
mod task;
mod workers;

pub use executor::{DEFAULT_EXECUTOR_ID, ReleaseTaskExecutor};
pub use manager::{
    PerformAdmission, PerformReleaseRequest, PrepareReleaseRequest, ReleaseManager,
    ReleaseManagerError, ReleaseManagerResult,
};
pub use queue::{QueueError, ReleaseQueues, TaskQueue};
pub use state::ReleaseState;
pub use task::{PerformTask, PrepareTask, ReleaseTask, RollbackTask};
pub use workers::{ReleaseWorkers, WorkerError, spawn_release_workers};
