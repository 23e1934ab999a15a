//! Queued release tasks, one variant per operation kind.

use crate::release::{
    domain::{ReleaseDescriptor, ReleaseId, ReleaseOperation},
    ports::ReleaseListener,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{fmt, sync::Arc};

/// Prepare request bound to its release.
#[derive(Clone)]
pub struct PrepareTask {
    release_id: ReleaseId,
    descriptor: ReleaseDescriptor,
    listener: Arc<dyn ReleaseListener>,
    resume: bool,
    dry_run: bool,
}

impl PrepareTask {
    /// Creates a prepare task that runs every phase for real.
    #[must_use]
    pub fn new(
        release_id: ReleaseId,
        descriptor: ReleaseDescriptor,
        listener: Arc<dyn ReleaseListener>,
    ) -> Self {
        Self {
            release_id,
            descriptor,
            listener,
            resume: false,
            dry_run: false,
        }
    }

    /// Skips phases the descriptor already records as completed.
    #[must_use]
    pub const fn resuming(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Simulates every phase instead of executing it.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        &self.release_id
    }

    /// Returns the descriptor to prepare from.
    #[must_use]
    pub const fn descriptor(&self) -> &ReleaseDescriptor {
        &self.descriptor
    }

    /// Returns whether completed phases are skipped.
    #[must_use]
    pub const fn is_resume(&self) -> bool {
        self.resume
    }

    /// Returns whether phases are simulated.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Perform request for a prepared release.
#[derive(Clone)]
pub struct PerformTask {
    release_id: ReleaseId,
    descriptor: ReleaseDescriptor,
    listener: Arc<dyn ReleaseListener>,
    build_directory: Utf8PathBuf,
    goals: String,
    use_release_profile: bool,
    local_repository: Option<Utf8PathBuf>,
}

impl PerformTask {
    /// Creates a perform task building in `build_directory` with the
    /// `deploy` goal and the release profile enabled.
    #[must_use]
    pub fn new(
        release_id: ReleaseId,
        descriptor: ReleaseDescriptor,
        listener: Arc<dyn ReleaseListener>,
        build_directory: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            release_id,
            descriptor,
            listener,
            build_directory: build_directory.into(),
            goals: "deploy".to_owned(),
            use_release_profile: true,
            local_repository: None,
        }
    }

    /// Sets the goals to run against the checkout.
    #[must_use]
    pub fn with_goals(mut self, goals: impl Into<String>) -> Self {
        self.goals = goals.into();
        self
    }

    /// Sets whether the release profile flag is passed.
    #[must_use]
    pub const fn with_release_profile(mut self, enabled: bool) -> Self {
        self.use_release_profile = enabled;
        self
    }

    /// Sets a local artifact repository for the perform build.
    #[must_use]
    pub fn with_local_repository(mut self, repository: Option<Utf8PathBuf>) -> Self {
        self.local_repository = repository;
        self
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        &self.release_id
    }

    /// Returns the prepared descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ReleaseDescriptor {
        &self.descriptor
    }

    /// Returns the directory the release tag is checked out into.
    #[must_use]
    pub fn build_directory(&self) -> &Utf8Path {
        &self.build_directory
    }

    /// Returns the goals to run.
    #[must_use]
    pub fn goals(&self) -> &str {
        &self.goals
    }

    /// Returns whether the release profile flag is passed.
    #[must_use]
    pub const fn use_release_profile(&self) -> bool {
        self.use_release_profile
    }

    /// Returns the local artifact repository override.
    #[must_use]
    pub fn local_repository(&self) -> Option<&Utf8Path> {
        self.local_repository.as_deref()
    }
}

/// Rollback request for a prepared release.
#[derive(Clone)]
pub struct RollbackTask {
    release_id: ReleaseId,
    descriptor: ReleaseDescriptor,
    listener: Arc<dyn ReleaseListener>,
}

impl RollbackTask {
    /// Creates a rollback task.
    #[must_use]
    pub fn new(
        release_id: ReleaseId,
        descriptor: ReleaseDescriptor,
        listener: Arc<dyn ReleaseListener>,
    ) -> Self {
        Self {
            release_id,
            descriptor,
            listener,
        }
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        &self.release_id
    }

    /// Returns the descriptor read from the working directory.
    #[must_use]
    pub const fn descriptor(&self) -> &ReleaseDescriptor {
        &self.descriptor
    }
}

/// One queued unit of work.
#[derive(Clone)]
pub enum ReleaseTask {
    /// Prepare a release.
    Prepare(PrepareTask),
    /// Perform a prepared release.
    Perform(PerformTask),
    /// Roll back a prepared release.
    Rollback(RollbackTask),
}

impl ReleaseTask {
    /// Returns the operation kind, which selects the queue.
    #[must_use]
    pub const fn operation(&self) -> ReleaseOperation {
        match self {
            Self::Prepare(_) => ReleaseOperation::Prepare,
            Self::Perform(_) => ReleaseOperation::Perform,
            Self::Rollback(_) => ReleaseOperation::Rollback,
        }
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        match self {
            Self::Prepare(task) => &task.release_id,
            Self::Perform(task) => &task.release_id,
            Self::Rollback(task) => &task.release_id,
        }
    }

    /// Returns the descriptor carried by the task.
    #[must_use]
    pub const fn descriptor(&self) -> &ReleaseDescriptor {
        match self {
            Self::Prepare(task) => &task.descriptor,
            Self::Perform(task) => &task.descriptor,
            Self::Rollback(task) => &task.descriptor,
        }
    }

    /// Returns the listener notified while the task runs.
    #[must_use]
    pub const fn listener(&self) -> &Arc<dyn ReleaseListener> {
        match self {
            Self::Prepare(task) => &task.listener,
            Self::Perform(task) => &task.listener,
            Self::Rollback(task) => &task.listener,
        }
    }
}

impl From<PrepareTask> for ReleaseTask {
    fn from(task: PrepareTask) -> Self {
        Self::Prepare(task)
    }
}

impl From<PerformTask> for ReleaseTask {
    fn from(task: PerformTask) -> Self {
        Self::Perform(task)
    }
}

impl From<RollbackTask> for ReleaseTask {
    fn from(task: RollbackTask) -> Self {
        Self::Rollback(task)
    }
}

impl fmt::Debug for ReleaseTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseTask")
            .field("operation", &self.operation())
            .field("release_id", self.release_id())
            .field("working_directory", &self.descriptor().working_directory)
            .finish_non_exhaustive()
    }
}
