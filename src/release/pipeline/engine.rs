//! Release engine assembling the phase catalogue into pipelines.

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    PhasePipeline, ReleasePhase, RunOptions,
    phases::{
        CheckoutProjectPhase, CommitKind, DEFAULT_TAG_FORMAT, EndReleasePhase,
        GenerateReactorProjectsPhase, MapDevelopmentVersionsPhase, MapReleaseVersionsPhase,
        RemoveReleaseDescriptorPhase, RemoveScmTagPhase, RestoreBackupManifestsPhase,
        RewriteManifestsPhase, RunPerformGoalsPhase, RunPreparationGoalsPhase, ScmCommitPhase,
        ScmTagPhase, UpdateWorkingCopyPhase, VersionTarget,
    },
};
use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment, ReleaseOutcome},
    ports::{
        DescriptorStore, GoalExecutor, ProjectManifests, ReleaseEngine, ReleaseEngineError,
        ReleaseEngineResult, ReleaseListener, ScmClient,
    },
};

/// Ports and options the phase catalogue is built from.
#[derive(Clone)]
pub struct PipelineCollaborators {
    /// Source control.
    pub scm: Arc<dyn ScmClient>,
    /// Build-tool goal runner.
    pub goals: Arc<dyn GoalExecutor>,
    /// Manifest reader and rewriter.
    pub manifests: Arc<dyn ProjectManifests>,
    /// Descriptor persistence.
    pub store: Arc<dyn DescriptorStore>,
    /// Tag label template with `group`, `artifact` and `version` in scope.
    pub tag_format: String,
    /// Build-tool executable used when a descriptor has no override.
    pub default_executable: String,
}

impl PipelineCollaborators {
    /// Creates collaborators with the default tag format and `mvn`.
    #[must_use]
    pub fn new(
        scm: Arc<dyn ScmClient>,
        goals: Arc<dyn GoalExecutor>,
        manifests: Arc<dyn ProjectManifests>,
        store: Arc<dyn DescriptorStore>,
    ) -> Self {
        Self {
            scm,
            goals,
            manifests,
            store,
            tag_format: DEFAULT_TAG_FORMAT.to_owned(),
            default_executable: "mvn".to_owned(),
        }
    }

    /// Sets the tag label template.
    #[must_use]
    pub fn with_tag_format(mut self, tag_format: impl Into<String>) -> Self {
        self.tag_format = tag_format.into();
        self
    }

    /// Sets the default build-tool executable.
    #[must_use]
    pub fn with_default_executable(mut self, executable: impl Into<String>) -> Self {
        self.default_executable = executable.into();
        self
    }
}

/// Release engine running one [`PhasePipeline`] per operation.
#[derive(Clone)]
pub struct PipelineReleaseEngine {
    prepare: PhasePipeline,
    perform: PhasePipeline,
    rollback: PhasePipeline,
}

impl PipelineReleaseEngine {
    /// Builds the standard prepare, perform and rollback pipelines.
    #[must_use]
    pub fn new(collaborators: &PipelineCollaborators) -> Self {
        Self::from_pipelines(
            prepare_pipeline(collaborators),
            perform_pipeline(collaborators),
            rollback_pipeline(collaborators),
        )
    }

    /// Creates an engine from custom pipelines.
    #[must_use]
    pub const fn from_pipelines(
        prepare: PhasePipeline,
        perform: PhasePipeline,
        rollback: PhasePipeline,
    ) -> Self {
        Self {
            prepare,
            perform,
            rollback,
        }
    }

    /// Returns the prepare pipeline.
    #[must_use]
    pub const fn prepare_pipeline(&self) -> &PhasePipeline {
        &self.prepare
    }

    /// Returns the perform pipeline.
    #[must_use]
    pub const fn perform_pipeline(&self) -> &PhasePipeline {
        &self.perform
    }

    /// Returns the rollback pipeline.
    #[must_use]
    pub const fn rollback_pipeline(&self) -> &PhasePipeline {
        &self.rollback
    }
}

fn prepare_pipeline(c: &PipelineCollaborators) -> PhasePipeline {
    let phases: Vec<Arc<dyn ReleasePhase>> = vec![
        Arc::new(UpdateWorkingCopyPhase::new(Arc::clone(&c.scm))),
        Arc::new(GenerateReactorProjectsPhase::new(Arc::clone(&c.manifests))),
        Arc::new(MapReleaseVersionsPhase),
        Arc::new(MapDevelopmentVersionsPhase),
        Arc::new(RewriteManifestsPhase::new(
            Arc::clone(&c.manifests),
            VersionTarget::Release,
        )),
        Arc::new(RunPreparationGoalsPhase::new(
            Arc::clone(&c.goals),
            c.default_executable.clone(),
        )),
        Arc::new(ScmCommitPhase::new(
            Arc::clone(&c.scm),
            CommitKind::Release,
            c.tag_format.clone(),
        )),
        Arc::new(ScmTagPhase::new(Arc::clone(&c.scm), c.tag_format.clone())),
        Arc::new(RewriteManifestsPhase::new(
            Arc::clone(&c.manifests),
            VersionTarget::Development,
        )),
        Arc::new(ScmCommitPhase::new(
            Arc::clone(&c.scm),
            CommitKind::Development,
            c.tag_format.clone(),
        )),
        Arc::new(EndReleasePhase::new(Arc::clone(&c.store))),
    ];
    PhasePipeline::new("prepare", phases).with_progress_store(Arc::clone(&c.store))
}

fn perform_pipeline(c: &PipelineCollaborators) -> PhasePipeline {
    let phases: Vec<Arc<dyn ReleasePhase>> = vec![
        Arc::new(CheckoutProjectPhase::new(Arc::clone(&c.scm))),
        Arc::new(RunPerformGoalsPhase::new(
            Arc::clone(&c.goals),
            Arc::clone(&c.manifests),
            c.default_executable.clone(),
        )),
    ];
    PhasePipeline::new("perform", phases)
}

fn rollback_pipeline(c: &PipelineCollaborators) -> PhasePipeline {
    let phases: Vec<Arc<dyn ReleasePhase>> = vec![
        Arc::new(GenerateReactorProjectsPhase::new(Arc::clone(&c.manifests))),
        Arc::new(RestoreBackupManifestsPhase::new(Arc::clone(&c.manifests))),
        Arc::new(ScmCommitPhase::new(
            Arc::clone(&c.scm),
            CommitKind::Rollback,
            c.tag_format.clone(),
        )),
        Arc::new(RemoveScmTagPhase::new(Arc::clone(&c.scm))),
        Arc::new(RemoveReleaseDescriptorPhase::new(Arc::clone(&c.store))),
    ];
    PhasePipeline::new("rollback", phases)
}

#[async_trait]
impl ReleaseEngine for PipelineReleaseEngine {
    async fn prepare_with_result(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        resume: bool,
        dry_run: bool,
        listener: &dyn ReleaseListener,
    ) -> ReleaseOutcome {
        let options = RunOptions {
            resume,
            dry_run,
            record_progress: true,
        };
        self.prepare
            .run(descriptor, environment, reactor_projects, options, listener)
            .await
    }

    async fn perform_with_result(
        &self,
        descriptor: &ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        listener: &dyn ReleaseListener,
    ) -> ReleaseOutcome {
        let mut working = descriptor.clone();
        self.perform
            .run(
                &mut working,
                environment,
                reactor_projects,
                RunOptions::default(),
                listener,
            )
            .await
    }

    async fn rollback(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        listener: &dyn ReleaseListener,
    ) -> ReleaseEngineResult<Vec<String>> {
        let outcome = self
            .rollback
            .run(
                descriptor,
                environment,
                reactor_projects,
                RunOptions::default(),
                listener,
            )
            .await;
        if outcome.is_success() {
            return Ok(outcome.output().to_vec());
        }
        Err(ReleaseEngineError::PhaseFailed {
            phase: outcome.failed_phase().unwrap_or("rollback").to_owned(),
            reason: outcome.error().unwrap_or("rollback failed").to_owned(),
        })
    }
}
