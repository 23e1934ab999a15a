//! Shared helpers for the end-to-end release lifecycle tests.

use std::{io, sync::Arc, time::Duration};

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use eyre::{WrapErr, eyre};
use marshal::{
    config::ReleaseConfig,
    release::{
        adapters::{
            fs::{FileDescriptorStore, TomlProjectManifests},
            memory::{InMemoryGoalExecutor, InMemoryScmClient},
        },
        domain::{ProjectDescriptor, ReleaseId, ReleaseOperation, ReleaseResult},
        pipeline::{PipelineCollaborators, PipelineReleaseEngine},
        ports::ProjectManifests,
        services::{
            PrepareReleaseRequest, ReleaseManager, ReleaseState, ReleaseTaskExecutor,
            ReleaseWorkers, spawn_release_workers,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use tempfile::TempDir;
use tokio::runtime::Runtime;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const POLL_ATTEMPTS: u32 = 500;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Returns the manifest registered for `group:artifact` at `version`.
pub fn manifest(group: &str, artifact: &str, version: &str) -> String {
    format!("[project]\ngroup = \"{group}\"\nartifact = \"{artifact}\"\nversion = \"{version}\"\n")
}

/// A running orchestrator: manager, worker threads and the in-memory
/// adapters behind them.
pub struct Orchestrator {
    temp: TempDir,
    pub root: Utf8PathBuf,
    pub scm: Arc<InMemoryScmClient>,
    pub goals: Arc<InMemoryGoalExecutor>,
    pub manager: ReleaseManager<FileDescriptorStore>,
    workers: ReleaseWorkers,
}

impl Orchestrator {
    /// Starts workers over a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the workers cannot be created.
    pub fn start(goals: InMemoryGoalExecutor) -> eyre::Result<Self> {
        let temp = tempfile::tempdir().wrap_err("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| eyre!("non-UTF-8 temp dir {}", path.display()))?;
        Self::launch(
            temp,
            root,
            Arc::new(InMemoryScmClient::new()),
            Arc::new(goals),
        )
    }

    fn launch(
        temp: TempDir,
        root: Utf8PathBuf,
        scm: Arc<InMemoryScmClient>,
        goals: Arc<InMemoryGoalExecutor>,
    ) -> eyre::Result<Self> {
        let config = ReleaseConfig::default();
        let manifests: Arc<dyn ProjectManifests> = Arc::new(TomlProjectManifests::new());
        let store = Arc::new(FileDescriptorStore::new());
        let collaborators = config.configure_pipeline(PipelineCollaborators::new(
            scm.clone(),
            goals.clone(),
            Arc::clone(&manifests),
            store.clone(),
        ));
        let state = Arc::new(ReleaseState::new());
        let executor = Arc::new(config.configure_executor(ReleaseTaskExecutor::new(
            Arc::new(PipelineReleaseEngine::new(&collaborators)),
            Arc::new(DefaultClock),
            Arc::clone(&state),
            config.settings_source(),
            manifests,
        )));
        let (queues, workers) = spawn_release_workers(&executor).wrap_err("spawn workers")?;
        let manager = ReleaseManager::new(state, queues, store)
            .with_manifest_file_name(config.manifest_file_name);
        Ok(Self {
            temp,
            root,
            scm,
            goals,
            manager,
            workers,
        })
    }

    /// Stops the workers and starts new ones with empty in-memory state,
    /// keeping the repositories and working directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker panicked or new workers cannot start.
    pub fn restart(self) -> eyre::Result<Self> {
        let goals = Arc::clone(&self.goals);
        self.relaunch(goals)
    }

    /// Restarts like [`Self::restart`] with a different goal executor.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker panicked or new workers cannot start.
    pub fn restart_with_goals(self, goals: InMemoryGoalExecutor) -> eyre::Result<Self> {
        self.relaunch(Arc::new(goals))
    }

    fn relaunch(self, goals: Arc<InMemoryGoalExecutor>) -> eyre::Result<Self> {
        let Self {
            temp,
            root,
            scm,
            manager,
            workers,
            ..
        } = self;
        drop(manager);
        workers.join().wrap_err("join workers")?;
        Self::launch(temp, root, scm, goals)
    }

    /// Closes the queues and waits for the workers to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker panicked.
    pub fn shutdown(self) -> eyre::Result<()> {
        drop(self.manager);
        self.workers.join().wrap_err("join workers")?;
        Ok(())
    }

    /// Returns the worker thread names.
    pub fn worker_names(&self) -> Vec<String> {
        self.workers.thread_names()
    }

    /// Registers a repository holding a single root manifest and returns the
    /// project descriptor pointing at it.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be registered.
    pub fn add_project(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> eyre::Result<ProjectDescriptor> {
        let url = format!("mem://{group}/{artifact}");
        self.scm
            .add_repository(
                url.clone(),
                [("project.toml", manifest(group, artifact, version))],
            )
            .wrap_err("register repository")?;
        Ok(ProjectDescriptor::new(group, artifact, url))
    }

    /// Returns the working directory used for `artifact`.
    pub fn working_directory(&self, artifact: &str) -> Utf8PathBuf {
        self.root.join("work").join(artifact)
    }

    /// Returns the perform build directory used for `artifact`.
    pub fn build_directory(&self, artifact: &str) -> Utf8PathBuf {
        self.root.join("checkout").join(artifact)
    }

    /// Builds a prepare request for `project` in its working directory.
    pub fn prepare_request(&self, project: ProjectDescriptor) -> PrepareReleaseRequest {
        let working_directory = self.working_directory(project.artifact_id());
        PrepareReleaseRequest::new(project, working_directory)
    }

    /// Reads a file from the working directory of `artifact`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn working_file(&self, artifact: &str, name: &str) -> eyre::Result<String> {
        let path = self.working_directory(artifact).join(name);
        std::fs::read_to_string(&path).wrap_err_with(|| format!("read {path}"))
    }

    /// Waits for the result of an `operation` admitted at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such result appears in time.
    pub async fn wait_for(
        &self,
        release_id: &ReleaseId,
        operation: ReleaseOperation,
        since: DateTime<Utc>,
    ) -> eyre::Result<ReleaseResult> {
        for _ in 0..POLL_ATTEMPTS {
            let finished = self.manager.release_result(release_id).filter(|result| {
                result.operation() == operation && result.start_time() >= since
            });
            if let Some(result) = finished {
                return Ok(result);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Err(eyre!("no {operation} result for {release_id}"))
    }
}
