//! Task executor: drives the release engine for one dequeued task.

use super::{PerformTask, ReleaseState, ReleaseTask};
use crate::release::{
    domain::{
        LOCAL_REPOSITORY_PROPERTY, ReactorProject, ReleaseDescriptor, ReleaseEnvironment,
        ReleaseOutcome, ReleaseResult, TaskRunId,
    },
    ports::{
        ProjectManifests, ReleaseEngine, ReleaseEngineError, SettingsResult, SettingsSource,
    },
};
use camino::Utf8PathBuf;
use futures::FutureExt;
use mockable::Clock;
use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};
use tracing::{Instrument, error, info, info_span, warn};

/// Executor identifier handed to the engine when none is configured.
pub const DEFAULT_EXECUTOR_ID: &str = "forked-path";

/// Runs dequeued tasks against a [`ReleaseEngine`] and publishes their
/// results into the shared [`ReleaseState`].
///
/// Every failure, including a panic inside the engine, is absorbed into a
/// failed [`ReleaseResult`]; `execute` itself never fails so the worker loop
/// keeps serving its queue.
pub struct ReleaseTaskExecutor<E, C>
where
    E: ReleaseEngine + ?Sized,
    C: Clock + Send + Sync,
{
    engine: Arc<E>,
    clock: Arc<C>,
    state: Arc<ReleaseState>,
    settings: Arc<dyn SettingsSource>,
    manifests: Arc<dyn ProjectManifests>,
    executor_id: String,
    tool_home: Option<Utf8PathBuf>,
}

impl<E, C> ReleaseTaskExecutor<E, C>
where
    E: ReleaseEngine + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates an executor publishing into `state`.
    #[must_use]
    pub fn new(
        engine: Arc<E>,
        clock: Arc<C>,
        state: Arc<ReleaseState>,
        settings: Arc<dyn SettingsSource>,
        manifests: Arc<dyn ProjectManifests>,
    ) -> Self {
        Self {
            engine,
            clock,
            state,
            settings,
            manifests,
            executor_id: DEFAULT_EXECUTOR_ID.to_owned(),
            tool_home: None,
        }
    }

    /// Sets the executor identifier recorded on each environment.
    #[must_use]
    pub fn with_executor_id(mut self, executor_id: impl Into<String>) -> Self {
        self.executor_id = executor_id.into();
        self
    }

    /// Sets the build-tool installation directory.
    #[must_use]
    pub fn with_tool_home(mut self, tool_home: Option<Utf8PathBuf>) -> Self {
        self.tool_home = tool_home;
        self
    }

    /// Returns the shared state results are published into.
    #[must_use]
    pub const fn state(&self) -> &Arc<ReleaseState> {
        &self.state
    }

    /// Executes one task to completion and stores its result.
    pub async fn execute(&self, task: ReleaseTask) {
        let run_id = TaskRunId::new();
        let span = info_span!(
            "release_task",
            release_id = %task.release_id(),
            operation = %task.operation(),
            run_id = %run_id,
        );
        self.run(task, run_id).instrument(span).await;
    }

    async fn run(&self, task: ReleaseTask, run_id: TaskRunId) {
        let started = ReleaseResult::started(task.operation(), run_id, self.clock.utc());
        let release_id = task.release_id().clone();
        let listener = Arc::clone(task.listener());
        info!("release task started");

        let dispatched = match self.environment() {
            Ok(environment) => AssertUnwindSafe(self.dispatch(&task, &environment))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(format!(
                        "release task panicked: {}",
                        panic_message(panic.as_ref())
                    ))
                }),
            Err(err) => Err(err.to_string()),
        };

        let end_time = self.clock.utc();
        let result = match dispatched {
            Ok(outcome) => started.completed(&outcome, end_time),
            Err(reason) => started.failed(reason, end_time),
        };

        if result.status().is_success() {
            info!("release task succeeded");
        } else {
            let reason = result.error().unwrap_or("release task failed");
            error!(error = reason, "release task failed");
            listener.error(reason);
        }

        self.state.store_result(release_id.clone(), result);
        self.state.release_listener(&release_id, &listener);
    }

    fn environment(&self) -> SettingsResult<ReleaseEnvironment> {
        let settings = self.settings.resolve()?;
        Ok(ReleaseEnvironment::new(self.executor_id.clone(), settings)
            .with_tool_home(self.tool_home.clone()))
    }

    async fn dispatch(
        &self,
        task: &ReleaseTask,
        environment: &ReleaseEnvironment,
    ) -> Result<ReleaseOutcome, String> {
        match task {
            ReleaseTask::Prepare(prepare) => {
                let mut descriptor = prepare.descriptor().clone();
                // A resumed run may skip reactor generation.
                let mut reactor_projects = if prepare.is_resume() {
                    self.reactor_projects(&descriptor)
                } else {
                    Vec::new()
                };
                let outcome = self
                    .engine
                    .prepare_with_result(
                        &mut descriptor,
                        environment,
                        &mut reactor_projects,
                        prepare.is_resume(),
                        prepare.is_dry_run(),
                        task.listener().as_ref(),
                    )
                    .await;
                if outcome.is_success() {
                    self.state
                        .insert_prepared(prepare.release_id().clone(), descriptor);
                }
                Ok(outcome)
            }
            ReleaseTask::Perform(perform) => {
                let descriptor = perform_descriptor(perform);
                let mut reactor_projects = self.reactor_projects(&descriptor);
                let outcome = self
                    .engine
                    .perform_with_result(
                        &descriptor,
                        environment,
                        &mut reactor_projects,
                        task.listener().as_ref(),
                    )
                    .await;
                if outcome.is_success() {
                    self.state.remove_prepared(perform.release_id());
                }
                Ok(outcome)
            }
            ReleaseTask::Rollback(rollback) => {
                let mut descriptor = rollback.descriptor().clone();
                let mut reactor_projects = Vec::new();
                let rolled_back = self
                    .engine
                    .rollback(
                        &mut descriptor,
                        environment,
                        &mut reactor_projects,
                        task.listener().as_ref(),
                    )
                    .await;
                match rolled_back {
                    Ok(output) => {
                        self.state.remove_prepared(rollback.release_id());
                        Ok(ReleaseOutcome::success(output))
                    }
                    Err(ReleaseEngineError::PhaseFailed { phase, reason }) => {
                        Ok(ReleaseOutcome::failure(Vec::new(), phase, reason))
                    }
                    Err(err @ ReleaseEngineError::Runtime(_)) => Err(err.to_string()),
                }
            }
        }
    }

    fn reactor_projects(&self, descriptor: &ReleaseDescriptor) -> Vec<ReactorProject> {
        let manifest = descriptor.manifest_path();
        self.manifests.read_projects(&manifest).unwrap_or_else(|err| {
            warn!(%manifest, error = %err, "cannot read reactor projects; continuing without them");
            Vec::new()
        })
    }
}

/// Applies the perform request's parameters to a copy of the prepared
/// descriptor.
fn perform_descriptor(task: &PerformTask) -> ReleaseDescriptor {
    let mut descriptor = task.descriptor().clone();
    descriptor.use_release_profile = task.use_release_profile();
    descriptor.perform_goals = Some(task.goals().to_owned());
    descriptor.checkout_directory = Some(task.build_directory().to_path_buf());
    if let Some(repository) = task.local_repository() {
        descriptor.append_argument(&format!("\"-D{LOCAL_REPOSITORY_PROPERTY}={repository}\""));
    }
    descriptor
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
