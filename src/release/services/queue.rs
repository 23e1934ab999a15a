//! FIFO admission queues, one per operation kind.

use super::ReleaseTask;
use crate::release::domain::ReleaseOperation;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised when a task cannot be admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The task belongs to another queue.
    #[error("{actual} task offered to the {expected} queue")]
    WrongKind {
        /// Operation the queue serves.
        expected: ReleaseOperation,
        /// Operation of the offered task.
        actual: ReleaseOperation,
    },

    /// The worker serving the queue has stopped.
    #[error("{0} queue is closed")]
    Closed(ReleaseOperation),
}

/// Unbounded FIFO queue feeding one worker.
///
/// `put` never waits: release requests are never dropped for capacity.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    kind: ReleaseOperation,
    sender: mpsc::UnboundedSender<ReleaseTask>,
}

impl TaskQueue {
    /// Creates a queue and the receiver its worker drains.
    #[must_use]
    pub fn channel(kind: ReleaseOperation) -> (Self, mpsc::UnboundedReceiver<ReleaseTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { kind, sender }, receiver)
    }

    /// Returns the operation this queue serves.
    #[must_use]
    pub const fn kind(&self) -> ReleaseOperation {
        self.kind
    }

    /// Enqueues a task behind every task already queued.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WrongKind`] for a task of another operation and
    /// [`QueueError::Closed`] when the worker has stopped.
    pub fn put(&self, task: ReleaseTask) -> Result<(), QueueError> {
        let actual = task.operation();
        if actual != self.kind {
            return Err(QueueError::WrongKind {
                expected: self.kind,
                actual,
            });
        }
        self.sender
            .send(task)
            .map_err(|_| QueueError::Closed(self.kind))
    }
}

/// The prepare, perform and rollback queues.
#[derive(Debug, Clone)]
pub struct ReleaseQueues {
    prepare: TaskQueue,
    perform: TaskQueue,
    rollback: TaskQueue,
}

impl ReleaseQueues {
    /// Groups the three queues.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WrongKind`] when a queue is passed in the wrong
    /// position.
    pub fn new(
        prepare: TaskQueue,
        perform: TaskQueue,
        rollback: TaskQueue,
    ) -> Result<Self, QueueError> {
        for (queue, expected) in [
            (&prepare, ReleaseOperation::Prepare),
            (&perform, ReleaseOperation::Perform),
            (&rollback, ReleaseOperation::Rollback),
        ] {
            if queue.kind() != expected {
                return Err(QueueError::WrongKind {
                    expected,
                    actual: queue.kind(),
                });
            }
        }
        Ok(Self {
            prepare,
            perform,
            rollback,
        })
    }

    /// Returns the queue serving `operation`.
    #[must_use]
    pub const fn queue(&self, operation: ReleaseOperation) -> &TaskQueue {
        match operation {
            ReleaseOperation::Prepare => &self.prepare,
            ReleaseOperation::Perform => &self.perform,
            ReleaseOperation::Rollback => &self.rollback,
        }
    }

    /// Routes a task to the queue of its operation.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] when that queue's worker has stopped.
    pub fn put(&self, task: ReleaseTask) -> Result<(), QueueError> {
        self.queue(task.operation()).put(task)
    }
}
