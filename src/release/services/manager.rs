//! Release manager façade: builds descriptors and admits tasks.

use super::{
    PerformTask, PrepareTask, QueueError, ReleaseQueues, ReleaseState, ReleaseTask, RollbackTask,
};
use crate::release::{
    adapters::listener::LoggingReleaseListener,
    domain::{
        ModuleKey, ProjectDescriptor, ReleaseDescriptor, ReleaseDomainError, ReleaseId,
        ReleaseProperties, ReleaseResult,
    },
    ports::{DescriptorStore, DescriptorStoreError, ReleaseListener},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for preparing a release.
#[derive(Clone)]
pub struct PrepareReleaseRequest {
    project: ProjectDescriptor,
    properties: ReleaseProperties,
    release_versions: BTreeMap<ModuleKey, String>,
    development_versions: BTreeMap<ModuleKey, String>,
    listener: Option<Arc<dyn ReleaseListener>>,
    working_directory: Utf8PathBuf,
    environment: BTreeMap<String, String>,
    executable: Option<String>,
}

impl PrepareReleaseRequest {
    /// Creates a request for `project` checked out at `working_directory`.
    #[must_use]
    pub fn new(project: ProjectDescriptor, working_directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project,
            properties: ReleaseProperties::default(),
            release_versions: BTreeMap::new(),
            development_versions: BTreeMap::new(),
            listener: None,
            working_directory: working_directory.into(),
            environment: BTreeMap::new(),
            executable: None,
        }
    }

    /// Sets the free-form release properties.
    #[must_use]
    pub fn with_properties(mut self, properties: ReleaseProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets explicit release versions per module.
    #[must_use]
    pub fn with_release_versions(mut self, versions: BTreeMap<ModuleKey, String>) -> Self {
        self.release_versions = versions;
        self
    }

    /// Sets explicit next development versions per module.
    #[must_use]
    pub fn with_development_versions(mut self, versions: BTreeMap<ModuleKey, String>) -> Self {
        self.development_versions = versions;
        self
    }

    /// Sets the listener notified while the release runs.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ReleaseListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets environment variables for build-tool invocations.
    #[must_use]
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Overrides the build-tool executable.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }
}

/// Request payload for performing a prepared release.
#[derive(Clone)]
pub struct PerformReleaseRequest {
    release_id: ReleaseId,
    build_directory: Utf8PathBuf,
    goals: Option<String>,
    arguments: Option<String>,
    use_release_profile: bool,
    listener: Option<Arc<dyn ReleaseListener>>,
    local_repository: Option<Utf8PathBuf>,
}

impl PerformReleaseRequest {
    /// Creates a request checking the release out into `build_directory`.
    #[must_use]
    pub fn new(release_id: ReleaseId, build_directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            release_id,
            build_directory: build_directory.into(),
            goals: None,
            arguments: None,
            use_release_profile: true,
            listener: None,
            local_repository: None,
        }
    }

    /// Sets the goals to run; `deploy` when unset.
    #[must_use]
    pub fn with_goals(mut self, goals: impl Into<String>) -> Self {
        self.goals = Some(goals.into());
        self
    }

    /// Replaces the prepared additional arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Sets whether the release profile flag is passed.
    #[must_use]
    pub const fn with_release_profile(mut self, enabled: bool) -> Self {
        self.use_release_profile = enabled;
        self
    }

    /// Sets the listener notified while the perform runs.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ReleaseListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets a local artifact repository for the perform build.
    #[must_use]
    pub fn with_local_repository(mut self, repository: impl Into<Utf8PathBuf>) -> Self {
        self.local_repository = Some(repository.into());
        self
    }

    /// Returns the release identifier.
    #[must_use]
    pub const fn release_id(&self) -> &ReleaseId {
        &self.release_id
    }
}

/// Whether a perform request was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum PerformAdmission {
    /// A perform task was queued.
    Enqueued,
    /// No prepared descriptor is held for the release; nothing was queued.
    NotPrepared,
}

/// Errors raised before a task is queued.
#[derive(Debug, Error)]
pub enum ReleaseManagerError {
    /// The project coordinates do not form a release identifier.
    #[error(transparent)]
    Domain(#[from] ReleaseDomainError),

    /// The persisted descriptor could not be read.
    #[error(transparent)]
    Store(#[from] DescriptorStoreError),

    /// The queue rejected the task.
    #[error("failed to queue release task: {0}")]
    Admission(#[from] QueueError),
}

/// Result type for release manager operations.
pub type ReleaseManagerResult<T> = Result<T, ReleaseManagerError>;

/// Entry point for prepare, perform and rollback requests.
///
/// Every operation returns as soon as its task is queued; outcomes are
/// published into [`ReleaseState`] by the workers and polled through
/// [`Self::release_result`] or observed through the listener.
pub struct ReleaseManager<S>
where
    S: DescriptorStore + ?Sized,
{
    state: Arc<ReleaseState>,
    queues: ReleaseQueues,
    store: Arc<S>,
    manifest_file_name: Option<String>,
}

impl<S> ReleaseManager<S>
where
    S: DescriptorStore + ?Sized,
{
    /// Creates a manager admitting into `queues` and sharing `state` with
    /// the workers.
    #[must_use]
    pub const fn new(state: Arc<ReleaseState>, queues: ReleaseQueues, store: Arc<S>) -> Self {
        Self {
            state,
            queues,
            store,
            manifest_file_name: None,
        }
    }

    /// Sets the manifest file name recorded on prepared descriptors.
    #[must_use]
    pub fn with_manifest_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.manifest_file_name = Some(file_name.into());
        self
    }

    /// Queues a prepare task and returns the release identifier.
    ///
    /// Property values are not validated here; bad versions or a missing
    /// SCM URL surface later as phase failures.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseManagerError::Domain`] for empty project coordinates
    /// and [`ReleaseManagerError::Admission`] when the queue rejects the task.
    pub fn prepare(&self, request: PrepareReleaseRequest) -> ReleaseManagerResult<ReleaseId> {
        let project = &request.project;
        let release_id = ReleaseId::from_coordinates(project.group_id(), project.artifact_id())?;
        let mut descriptor =
            ReleaseDescriptor::for_prepare(project, &request.properties, request.working_directory)
                .with_release_versions(request.release_versions)
                .with_development_versions(request.development_versions)
                .with_environment(request.environment);
        descriptor.executable = request.executable;
        descriptor.manifest_file_name.clone_from(&self.manifest_file_name);

        let listener = listener_or_default(request.listener, &release_id);
        self.admit(PrepareTask::new(release_id.clone(), descriptor, listener).into())?;
        info!(%release_id, "prepare queued");
        Ok(release_id)
    }

    /// Queues a perform task for a release prepared by this process.
    ///
    /// The persisted store is never consulted: without an in-memory prepared
    /// descriptor nothing is queued and [`PerformAdmission::NotPrepared`] is
    /// returned. Use [`Self::perform_from_working_directory`] after a
    /// restart.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseManagerError::Admission`] when the queue rejects the
    /// task.
    pub fn perform(&self, request: PerformReleaseRequest) -> ReleaseManagerResult<PerformAdmission> {
        let Some(descriptor) = self.state.prepared_release(&request.release_id) else {
            debug!(release_id = %request.release_id, "perform skipped; release not prepared");
            return Ok(PerformAdmission::NotPrepared);
        };
        self.enqueue_perform(request, descriptor)?;
        Ok(PerformAdmission::Enqueued)
    }

    /// Queues a perform task using the descriptor persisted in
    /// `working_directory`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseManagerError::Store`] when the descriptor cannot be
    /// read and [`ReleaseManagerError::Admission`] when the queue rejects the
    /// task.
    pub async fn perform_from_working_directory(
        &self,
        request: PerformReleaseRequest,
        working_directory: &Utf8Path,
    ) -> ReleaseManagerResult<()> {
        let descriptor = self.read_descriptor(working_directory).await?;
        self.enqueue_perform(request, descriptor)
    }

    /// Queues a prepare task that resumes from the progress persisted in
    /// `working_directory`, skipping the phases it records as completed.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseManagerError::Store`] when no progress is persisted
    /// and [`ReleaseManagerError::Admission`] when the queue rejects the
    /// task.
    pub async fn resume_prepare(
        &self,
        release_id: ReleaseId,
        working_directory: &Utf8Path,
        listener: Option<Arc<dyn ReleaseListener>>,
    ) -> ReleaseManagerResult<()> {
        let descriptor = self.read_descriptor(working_directory).await?;
        let listener = listener_or_default(listener, &release_id);
        let task = PrepareTask::new(release_id.clone(), descriptor, listener).resuming(true);
        self.admit(task.into())?;
        info!(%release_id, "prepare resumed");
        Ok(())
    }

    /// Queues a rollback task using the descriptor persisted in
    /// `working_directory`, regardless of in-memory state.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseManagerError::Store`] when the descriptor cannot be
    /// read and [`ReleaseManagerError::Admission`] when the queue rejects the
    /// task.
    pub async fn rollback(
        &self,
        release_id: ReleaseId,
        working_directory: &Utf8Path,
        listener: Option<Arc<dyn ReleaseListener>>,
    ) -> ReleaseManagerResult<()> {
        let descriptor = self.read_descriptor(working_directory).await?;
        let listener = listener_or_default(listener, &release_id);
        self.admit(RollbackTask::new(release_id.clone(), descriptor, listener).into())?;
        info!(%release_id, "rollback queued");
        Ok(())
    }

    /// Returns the shared release state.
    #[must_use]
    pub const fn state(&self) -> &Arc<ReleaseState> {
        &self.state
    }

    /// Returns a snapshot of the prepared releases.
    #[must_use]
    pub fn prepared_releases(&self) -> BTreeMap<ReleaseId, ReleaseDescriptor> {
        self.state.prepared_releases()
    }

    /// Returns the prepared descriptor for `release_id`.
    #[must_use]
    pub fn prepared_release(&self, release_id: &ReleaseId) -> Option<ReleaseDescriptor> {
        self.state.prepared_release(release_id)
    }

    /// Returns a snapshot of the latest result per release.
    #[must_use]
    pub fn release_results(&self) -> BTreeMap<ReleaseId, ReleaseResult> {
        self.state.release_results()
    }

    /// Returns the latest result for `release_id`.
    #[must_use]
    pub fn release_result(&self, release_id: &ReleaseId) -> Option<ReleaseResult> {
        self.state.release_result(release_id)
    }

    /// Returns a snapshot of the listeners of in-flight operations.
    #[must_use]
    pub fn listeners(&self) -> BTreeMap<ReleaseId, Arc<dyn ReleaseListener>> {
        self.state.listeners()
    }

    async fn read_descriptor(
        &self,
        working_directory: &Utf8Path,
    ) -> ReleaseManagerResult<ReleaseDescriptor> {
        let partial = ReleaseDescriptor::new(working_directory);
        Ok(self.store.read(&partial).await?)
    }

    fn enqueue_perform(
        &self,
        request: PerformReleaseRequest,
        mut descriptor: ReleaseDescriptor,
    ) -> ReleaseManagerResult<()> {
        if let Some(arguments) = request.arguments {
            descriptor.additional_arguments = Some(arguments);
        }
        let release_id = request.release_id;
        let listener = listener_or_default(request.listener, &release_id);
        let mut task = PerformTask::new(
            release_id.clone(),
            descriptor,
            listener,
            request.build_directory,
        )
        .with_release_profile(request.use_release_profile)
        .with_local_repository(request.local_repository);
        if let Some(goals) = request.goals {
            task = task.with_goals(goals);
        }
        self.admit(task.into())?;
        info!(%release_id, "perform queued");
        Ok(())
    }

    fn admit(&self, task: ReleaseTask) -> ReleaseManagerResult<()> {
        let release_id = task.release_id().clone();
        let listener = Arc::clone(task.listener());
        self.state
            .register_listener(release_id.clone(), Arc::clone(&listener));
        self.queues.put(task).map_err(|err| {
            self.state.release_listener(&release_id, &listener);
            ReleaseManagerError::from(err)
        })
    }
}

fn listener_or_default(
    listener: Option<Arc<dyn ReleaseListener>>,
    release_id: &ReleaseId,
) -> Arc<dyn ReleaseListener> {
    listener.unwrap_or_else(|| Arc::new(LoggingReleaseListener::for_release(release_id.clone())))
}
