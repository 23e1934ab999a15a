//! Dedicated worker threads, one per queue kind.

use super::{QueueError, ReleaseQueues, ReleaseTask, ReleaseTaskExecutor, TaskQueue};
use crate::release::{domain::ReleaseOperation, ports::ReleaseEngine};
use mockable::Clock;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
use thiserror::Error;
use tokio::{runtime::Builder, sync::mpsc};
use tracing::debug;

/// Errors raised while starting or joining the workers.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker's runtime could not be built.
    #[error("failed to build the {kind} worker runtime: {source}")]
    Runtime {
        /// Queue the worker serves.
        kind: ReleaseOperation,
        /// Runtime builder error.
        source: std::io::Error,
    },

    /// The worker thread could not be spawned.
    #[error("failed to spawn the {kind} worker thread: {source}")]
    Spawn {
        /// Queue the worker serves.
        kind: ReleaseOperation,
        /// Thread spawn error.
        source: std::io::Error,
    },

    /// The queues could not be grouped.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A worker thread panicked outside task execution.
    #[error("the {0} worker thread panicked")]
    Panicked(ReleaseOperation),
}

/// Handles of the running worker threads.
#[derive(Debug)]
pub struct ReleaseWorkers {
    handles: Vec<(ReleaseOperation, JoinHandle<()>)>,
}

impl ReleaseWorkers {
    /// Returns the names of the worker threads.
    #[must_use]
    pub fn thread_names(&self) -> Vec<String> {
        self.handles
            .iter()
            .filter_map(|(_, handle)| handle.thread().name().map(str::to_owned))
            .collect()
    }

    /// Waits for every worker to stop.
    ///
    /// Workers stop once every clone of their queue has been dropped and the
    /// tasks already queued have run.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] when a worker thread panicked.
    pub fn join(self) -> Result<(), WorkerError> {
        for (kind, handle) in self.handles {
            handle.join().map_err(|_| WorkerError::Panicked(kind))?;
        }
        Ok(())
    }
}

/// Starts one worker thread per operation kind, all sharing `executor`.
///
/// Each worker owns a single-threaded runtime and drains its queue in FIFO
/// order for as long as the queue is open.
///
/// # Errors
///
/// Returns [`WorkerError`] when a runtime or thread cannot be created.
pub fn spawn_release_workers<E, C>(
    executor: &Arc<ReleaseTaskExecutor<E, C>>,
) -> Result<(ReleaseQueues, ReleaseWorkers), WorkerError>
where
    E: ReleaseEngine + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let (prepare, prepare_handle) = spawn_worker(ReleaseOperation::Prepare, executor)?;
    let (perform, perform_handle) = spawn_worker(ReleaseOperation::Perform, executor)?;
    let (rollback, rollback_handle) = spawn_worker(ReleaseOperation::Rollback, executor)?;
    let queues = ReleaseQueues::new(prepare, perform, rollback)?;
    let workers = ReleaseWorkers {
        handles: vec![
            (ReleaseOperation::Prepare, prepare_handle),
            (ReleaseOperation::Perform, perform_handle),
            (ReleaseOperation::Rollback, rollback_handle),
        ],
    };
    Ok((queues, workers))
}

fn spawn_worker<E, C>(
    kind: ReleaseOperation,
    executor: &Arc<ReleaseTaskExecutor<E, C>>,
) -> Result<(TaskQueue, JoinHandle<()>), WorkerError>
where
    E: ReleaseEngine + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| WorkerError::Runtime { kind, source })?;
    let (queue, receiver) = TaskQueue::channel(kind);
    let worker_executor = Arc::clone(executor);
    let handle = thread::Builder::new()
        .name(format!("release-{kind}"))
        .spawn(move || runtime.block_on(serve(kind, worker_executor, receiver)))
        .map_err(|source| WorkerError::Spawn { kind, source })?;
    Ok((queue, handle))
}

async fn serve<E, C>(
    kind: ReleaseOperation,
    executor: Arc<ReleaseTaskExecutor<E, C>>,
    mut receiver: mpsc::UnboundedReceiver<ReleaseTask>,
) where
    E: ReleaseEngine + ?Sized,
    C: Clock + Send + Sync,
{
    debug!(queue = %kind, "release worker started");
    while let Some(task) = receiver.recv().await {
        executor.execute(task).await;
    }
    debug!(queue = %kind, "release worker stopped");
}
