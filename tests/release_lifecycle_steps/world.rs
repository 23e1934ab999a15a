//! Shared world state for release lifecycle BDD scenarios.

use std::{sync::Arc, time::Duration};

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use eyre::{WrapErr, eyre};
use marshal::release::{
    adapters::{
        fs::{FileDescriptorStore, TomlProjectManifests},
        memory::{InMemoryGoalExecutor, InMemoryScmClient, RecordingReleaseListener},
        settings::StaticSettingsSource,
    },
    domain::{ModuleKey, ReleaseId, ReleaseOperation, ReleaseResult, ToolSettings},
    pipeline::{PipelineCollaborators, PipelineReleaseEngine},
    ports::ProjectManifests,
    services::{
        PerformAdmission, ReleaseManager, ReleaseState, ReleaseTaskExecutor, ReleaseWorkers,
        spawn_release_workers,
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use tempfile::TempDir;

/// Orchestrator started by the background step.
pub struct Running {
    _temp: TempDir,
    pub root: Utf8PathBuf,
    pub scm: Arc<InMemoryScmClient>,
    pub manager: ReleaseManager<FileDescriptorStore>,
    _workers: ReleaseWorkers,
}

/// Scenario world for release lifecycle behaviour tests.
#[derive(Default)]
pub struct ReleaseWorld {
    pub goals: InMemoryGoalExecutor,
    pub listener: RecordingReleaseListener,
    pub running: Option<Running>,
    pub perform_admission: Option<PerformAdmission>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReleaseWorld {
    /// Starts the workers over a fresh temporary directory.
    ///
    /// The goal executor handle is shared, so goals made to fail later in a
    /// scenario affect the running workers.
    pub fn start(&mut self) -> eyre::Result<()> {
        let temp = tempfile::tempdir().wrap_err("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| eyre!("non-UTF-8 temp dir {}", path.display()))?;
        let scm = Arc::new(InMemoryScmClient::new());
        let manifests: Arc<dyn ProjectManifests> = Arc::new(TomlProjectManifests::new());
        let store = Arc::new(FileDescriptorStore::new());
        let collaborators = PipelineCollaborators::new(
            scm.clone(),
            Arc::new(self.goals.clone()),
            Arc::clone(&manifests),
            store.clone(),
        );
        let state = Arc::new(ReleaseState::new());
        let executor = Arc::new(ReleaseTaskExecutor::new(
            Arc::new(PipelineReleaseEngine::new(&collaborators)),
            Arc::new(DefaultClock),
            Arc::clone(&state),
            Arc::new(StaticSettingsSource::new(ToolSettings::default())),
            manifests,
        ));
        let (queues, workers) = spawn_release_workers(&executor).wrap_err("spawn workers")?;
        self.running = Some(Running {
            _temp: temp,
            root,
            scm,
            manager: ReleaseManager::new(state, queues, store),
            _workers: workers,
        });
        Ok(())
    }

    /// Returns the running orchestrator.
    pub fn running(&self) -> eyre::Result<&Running> {
        self.running
            .as_ref()
            .ok_or_else(|| eyre!("orchestrator not started in scenario world"))
    }

    /// Records the admission time of the next operation.
    pub fn mark_submission(&mut self) {
        self.submitted_at = Some(Utc::now());
    }

    /// Waits for the result of the last submitted `operation`.
    pub fn await_result(
        &self,
        release_id: &ReleaseId,
        operation: ReleaseOperation,
    ) -> eyre::Result<ReleaseResult> {
        let since = self
            .submitted_at
            .ok_or_else(|| eyre!("no operation submitted in scenario world"))?;
        let running = self.running()?;
        run_async(async {
            for _ in 0..500 {
                let finished = running.manager.release_result(release_id).filter(|result| {
                    result.operation() == operation && result.start_time() >= since
                });
                if let Some(result) = finished {
                    return Ok(result);
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(eyre!("no {operation} result for {release_id}"))
        })
    }
}

impl Running {
    /// Returns the working directory of a module.
    pub fn working_directory(&self, key: &ModuleKey) -> Utf8PathBuf {
        self.root.join("work").join(key.artifact())
    }

    /// Returns the perform build directory of a module.
    pub fn build_directory(&self, key: &ModuleKey) -> Utf8PathBuf {
        self.root.join("checkout").join(key.artifact())
    }

    /// Returns the repository URL registered for a module.
    pub fn repository_url(key: &ModuleKey) -> String {
        format!("mem://{}/{}", key.group(), key.artifact())
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReleaseWorld {
    ReleaseWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a `group:artifact` scenario value.
pub fn module_key(value: &str) -> eyre::Result<ModuleKey> {
    ModuleKey::parse(value).wrap_err_with(|| format!("invalid module key '{value}'"))
}
