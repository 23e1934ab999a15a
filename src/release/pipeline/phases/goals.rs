//! Build-tool goal phases.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::{DEFAULT_PERFORM_GOALS, RELEASE_PROFILE_ARGUMENT, goal_request};
use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment},
    pipeline::{PhaseReport, PhaseResult, ReleasePhase, ReleasePhaseError},
    ports::{GoalExecutor, ProjectManifests},
};

fn output_report(output: &str) -> PhaseReport {
    let mut report = PhaseReport::new();
    for line in output.lines() {
        report.push(line);
    }
    report
}

/// Runs the preparation goals in the working directory, if any are set.
pub struct RunPreparationGoalsPhase {
    goals: Arc<dyn GoalExecutor>,
    default_executable: String,
}

impl RunPreparationGoalsPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(goals: Arc<dyn GoalExecutor>, default_executable: impl Into<String>) -> Self {
        Self {
            goals,
            default_executable: default_executable.into(),
        }
    }
}

#[async_trait]
impl ReleasePhase for RunPreparationGoalsPhase {
    fn name(&self) -> &'static str {
        "run-preparation-goals"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let Some(goals) = descriptor
            .preparation_goals
            .clone()
            .filter(|goals| !goals.trim().is_empty())
        else {
            return Ok(PhaseReport::new());
        };
        let request = goal_request(
            descriptor,
            environment,
            descriptor.working_directory.clone(),
            goals,
            descriptor.additional_arguments.clone(),
            &self.default_executable,
        );
        let output = self.goals.run_goals(&request).await?;
        Ok(output_report(&output))
    }
}

/// Runs the perform goals against the release checkout.
///
/// The build directory is the checkout's manifest declaring the same module
/// as the root manifest, which may sit below the checkout root; otherwise the
/// checkout directory itself. The release-profile property is appended to
/// the arguments when requested.
pub struct RunPerformGoalsPhase {
    goals: Arc<dyn GoalExecutor>,
    manifests: Arc<dyn ProjectManifests>,
    default_executable: String,
}

impl RunPerformGoalsPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(
        goals: Arc<dyn GoalExecutor>,
        manifests: Arc<dyn ProjectManifests>,
        default_executable: impl Into<String>,
    ) -> Self {
        Self {
            goals,
            manifests,
            default_executable: default_executable.into(),
        }
    }

    fn build_directory(
        &self,
        descriptor: &ReleaseDescriptor,
        reactor_projects: &[ReactorProject],
    ) -> Result<Utf8PathBuf, ReleasePhaseError> {
        let checkout = descriptor.checkout_directory().to_path_buf();
        let root_key = reactor_projects
            .first()
            .map(|root| root.key().clone())
            .or_else(|| {
                self.manifests
                    .read_projects(&descriptor.manifest_path())
                    .ok()
                    .and_then(|projects| projects.into_iter().next())
                    .map(|root| root.key().clone())
            });
        let Some(key) = root_key else {
            debug!(%checkout, "no root manifest; building in checkout directory");
            return Ok(checkout);
        };
        let found =
            self.manifests
                .find_matching(&checkout, &key, descriptor.manifest_file_name())?;
        Ok(found
            .and_then(|manifest| manifest.parent().map(camino::Utf8Path::to_path_buf))
            .unwrap_or(checkout))
    }
}

fn perform_arguments(descriptor: &ReleaseDescriptor) -> Option<String> {
    let base = descriptor
        .additional_arguments
        .clone()
        .filter(|args| !args.trim().is_empty());
    if !descriptor.use_release_profile {
        return base;
    }
    Some(base.map_or_else(
        || RELEASE_PROFILE_ARGUMENT.to_owned(),
        |args| format!("{args} {RELEASE_PROFILE_ARGUMENT}"),
    ))
}

#[async_trait]
impl ReleasePhase for RunPerformGoalsPhase {
    fn name(&self) -> &'static str {
        "run-perform-goals"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let directory = self.build_directory(descriptor, reactor_projects)?;
        let goals = descriptor
            .perform_goals
            .clone()
            .filter(|goals| !goals.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PERFORM_GOALS.to_owned());
        let request = goal_request(
            descriptor,
            environment,
            directory,
            goals,
            perform_arguments(descriptor),
            &self.default_executable,
        );
        let output = self.goals.run_goals(&request).await?;
        Ok(output_report(&output))
    }
}
