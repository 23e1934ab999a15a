//! Release engine port: runs the phase sequence for one operation.

use super::ReleaseListener;
use crate::release::domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment, ReleaseOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for fallible release engine calls.
pub type ReleaseEngineResult<T> = Result<T, ReleaseEngineError>;

/// Executes prepare, perform and rollback phase sequences.
///
/// The executors hand every call a freshly constructed environment and either
/// an empty or a freshly generated reactor project list. Listener callbacks
/// are issued at goal and phase boundaries; reporting failures through
/// [`ReleaseListener::error`] is left to the caller.
#[async_trait]
pub trait ReleaseEngine: Send + Sync {
    /// Runs the prepare sequence, mutating the descriptor as phases complete.
    ///
    /// With `resume` set, phases up to the descriptor's completed phase are
    /// skipped. With `dry_run` set, every phase is simulated.
    async fn prepare_with_result(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        resume: bool,
        dry_run: bool,
        listener: &dyn ReleaseListener,
    ) -> ReleaseOutcome;

    /// Runs the perform sequence. The descriptor is never mutated.
    async fn perform_with_result(
        &self,
        descriptor: &ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        listener: &dyn ReleaseListener,
    ) -> ReleaseOutcome;

    /// Runs the rollback sequence and returns its output lines.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseEngineError::PhaseFailed`] when a rollback phase fails.
    async fn rollback(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        listener: &dyn ReleaseListener,
    ) -> ReleaseEngineResult<Vec<String>>;
}

/// Errors raised by release engines outside the outcome channel.
#[derive(Debug, Clone, Error)]
pub enum ReleaseEngineError {
    /// A phase in the sequence failed.
    #[error("release phase '{phase}' failed: {reason}")]
    PhaseFailed {
        /// Name of the failed phase.
        phase: String,
        /// Failure reason.
        reason: String,
    },

    /// Engine infrastructure failure.
    #[error("release engine error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReleaseEngineError {
    /// Wraps an engine infrastructure error.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
