//! Reactor project generation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment},
    pipeline::{PhaseReport, PhaseResult, ReleasePhase},
    ports::ProjectManifests,
};

/// Reads the descriptor's root manifest into the reactor project list.
///
/// Read failures surface as a failed phase; the list is only replaced when
/// every manifest was read.
pub struct GenerateReactorProjectsPhase {
    manifests: Arc<dyn ProjectManifests>,
}

impl GenerateReactorProjectsPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(manifests: Arc<dyn ProjectManifests>) -> Self {
        Self { manifests }
    }

    fn generate(
        &self,
        descriptor: &ReleaseDescriptor,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let manifest = descriptor.manifest_path();
        let projects = self.manifests.read_projects(&manifest)?;
        let mut report = PhaseReport::line(format!(
            "{} module(s) read from {manifest}",
            projects.len()
        ));
        for project in &projects {
            report.push(format!("{} {}", project.key(), project.version()));
        }
        *reactor_projects = projects;
        Ok(report)
    }
}

#[async_trait]
impl ReleasePhase for GenerateReactorProjectsPhase {
    fn name(&self) -> &'static str {
        "generate-reactor-projects"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        self.generate(descriptor, reactor_projects)
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        self.generate(descriptor, reactor_projects)
    }
}
