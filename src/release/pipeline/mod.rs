//! Phase pipeline and the pipeline-backed release engine.
//!
//! A [`ReleasePhase`] is one independent, individually replaceable step of a
//! release operation. A [`PhasePipeline`] runs an ordered list of phases
//! against a descriptor, reports progress to the listener and stops at the
//! first failure. [`PipelineReleaseEngine`] wires the prepare, perform and
//! rollback pipelines from the port adapters.

mod engine;
pub mod phases;

pub use engine::{PipelineCollaborators, PipelineReleaseEngine};

use crate::release::{
    domain::{ModuleKey, ReactorProject, ReleaseDescriptor, ReleaseEnvironment, ReleaseOutcome},
    ports::{
        DescriptorStore, DescriptorStoreError, GoalExecutorError, ManifestError, ReleaseListener,
        ScmError,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type returned by phases.
pub type PhaseResult = Result<PhaseReport, ReleasePhaseError>;

/// Output collected from one successful phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseReport {
    lines: Vec<String>,
}

impl PhaseReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Creates a report holding one line.
    #[must_use]
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
        }
    }

    /// Appends a line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Returns the collected lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the report, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Errors raised by release phases.
#[derive(Debug, Error)]
pub enum ReleasePhaseError {
    /// Source-control operation failed.
    #[error(transparent)]
    Scm(#[from] ScmError),

    /// Build-tool goals failed.
    #[error(transparent)]
    Goals(#[from] GoalExecutorError),

    /// Manifest read or rewrite failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Descriptor persistence failed.
    #[error(transparent)]
    Store(#[from] DescriptorStoreError),

    /// The descriptor has no source-control URL.
    #[error("release descriptor has no scm url")]
    MissingScmUrl,

    /// No reactor projects were generated before a phase that needs them.
    #[error("no reactor projects; generate-reactor-projects must run first")]
    NoReactorProjects,

    /// A module has no mapped version.
    #[error("no {kind} version mapped for {module}")]
    MissingVersion {
        /// Module lacking a version.
        module: ModuleKey,
        /// `release` or `development`.
        kind: &'static str,
    },

    /// The descriptor has no release label where one is required.
    #[error("release descriptor has no scm release label")]
    MissingReleaseLabel,

    /// The tag label template failed to render.
    #[error("failed to render tag label template '{template}': {reason}")]
    TemplateRender {
        /// Template source.
        template: String,
        /// Renderer message.
        reason: String,
    },

    /// Filesystem failure outside the ports.
    #[error("release filesystem error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl ReleasePhaseError {
    /// Wraps a filesystem error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// One step of a release operation.
#[async_trait]
pub trait ReleasePhase: Send + Sync {
    /// Returns the phase name reported to listeners.
    fn name(&self) -> &'static str;

    /// Runs the phase with real side effects.
    ///
    /// # Errors
    ///
    /// Returns [`ReleasePhaseError`] when the phase cannot complete.
    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult;

    /// Dry-runs the phase without destructive side effects.
    ///
    /// The default reports what would run and touches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ReleasePhaseError`] when the simulation detects a failure.
    async fn simulate(
        &self,
        _descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        Ok(PhaseReport::line(format!("would run {}", self.name())))
    }
}

/// Flags controlling one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip phases up to and including the descriptor's completed phase.
    pub resume: bool,
    /// Simulate every phase.
    pub dry_run: bool,
    /// Record each executed phase as the descriptor's completed phase.
    pub record_progress: bool,
}

/// Ordered phase sequence for one goal.
#[derive(Clone)]
pub struct PhasePipeline {
    goal: &'static str,
    phases: Vec<Arc<dyn ReleasePhase>>,
    progress_store: Option<Arc<dyn DescriptorStore>>,
}

impl PhasePipeline {
    /// Creates a pipeline running `phases` in order.
    #[must_use]
    pub fn new(goal: &'static str, phases: Vec<Arc<dyn ReleasePhase>>) -> Self {
        Self {
            goal,
            phases,
            progress_store: None,
        }
    }

    /// Persists the descriptor after every phase whose progress is recorded,
    /// so a run that fails midway can still be rolled back or resumed.
    #[must_use]
    pub fn with_progress_store(mut self, store: Arc<dyn DescriptorStore>) -> Self {
        self.progress_store = Some(store);
        self
    }

    /// Returns the goal name.
    #[must_use]
    pub const fn goal(&self) -> &'static str {
        self.goal
    }

    /// Returns the phase names in execution order.
    #[must_use]
    pub fn phase_names(&self) -> Vec<String> {
        self.phases
            .iter()
            .map(|phase| phase.name().to_owned())
            .collect()
    }

    fn resume_point(&self, descriptor: &ReleaseDescriptor, options: RunOptions) -> Option<String> {
        if !options.resume {
            return None;
        }
        descriptor
            .completed_phase
            .clone()
            .filter(|completed| self.phases.iter().any(|phase| phase.name() == completed))
    }

    async fn record_progress(
        &self,
        descriptor: &mut ReleaseDescriptor,
        name: &str,
        options: RunOptions,
    ) -> Result<(), DescriptorStoreError> {
        if !options.record_progress || options.dry_run {
            return Ok(());
        }
        descriptor.completed_phase = Some(name.to_owned());
        match &self.progress_store {
            Some(store) => store.write(descriptor).await,
            None => Ok(()),
        }
    }

    /// Runs the phases in order, stopping at the first failure.
    ///
    /// Output lines are prefixed with the phase name. A failing phase is
    /// reported in the outcome; the listener's `error` callback is left to
    /// the task executor.
    pub async fn run(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
        options: RunOptions,
        listener: &dyn ReleaseListener,
    ) -> ReleaseOutcome {
        listener.goal_start(self.goal, &self.phase_names());
        let mut skip_through = self.resume_point(descriptor, options);
        let mut output = Vec::new();

        for phase in &self.phases {
            let name = phase.name();
            if let Some(completed) = skip_through.as_deref() {
                listener.phase_skip(name);
                if completed == name {
                    skip_through = None;
                }
                continue;
            }

            listener.phase_start(name);
            let result = if options.dry_run {
                phase.simulate(descriptor, environment, reactor_projects).await
            } else {
                phase.execute(descriptor, environment, reactor_projects).await
            };

            match result {
                Ok(report) => {
                    debug!(goal = self.goal, phase = name, "release phase completed");
                    output.extend(
                        report
                            .into_lines()
                            .into_iter()
                            .map(|line| format!("[{name}] {line}")),
                    );
                    if let Err(err) = self.record_progress(descriptor, name, options).await {
                        warn!(
                            goal = self.goal,
                            phase = name,
                            error = %err,
                            "release progress not persisted"
                        );
                        output.push(format!("[{name}] {err}"));
                        return ReleaseOutcome::failure(output, name, err.to_string());
                    }
                    listener.phase_end();
                }
                Err(err) => {
                    warn!(goal = self.goal, phase = name, error = %err, "release phase failed");
                    output.push(format!("[{name}] {err}"));
                    return ReleaseOutcome::failure(output, name, err.to_string());
                }
            }
        }

        listener.goal_end();
        ReleaseOutcome::success(output)
    }
}
