//! Commit and tag phases.

use async_trait::async_trait;
use std::sync::Arc;

use super::{comment, release_label};
use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment},
    pipeline::{PhaseReport, PhaseResult, ReleasePhase, ReleasePhaseError},
    ports::ScmClient,
};

/// Which change set a commit phase records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Manifests rewritten to release versions.
    Release,
    /// Manifests rewritten to the next development versions.
    Development,
    /// Manifests restored by a rollback.
    Rollback,
}

/// Commits the working copy with a message describing the release step.
pub struct ScmCommitPhase {
    scm: Arc<dyn ScmClient>,
    kind: CommitKind,
    tag_format: String,
}

impl ScmCommitPhase {
    /// Creates the phase; `tag_format` names the release in messages when the
    /// descriptor has no label yet.
    #[must_use]
    pub fn new(scm: Arc<dyn ScmClient>, kind: CommitKind, tag_format: impl Into<String>) -> Self {
        Self {
            scm,
            kind,
            tag_format: tag_format.into(),
        }
    }

    fn message(
        &self,
        descriptor: &ReleaseDescriptor,
        reactor_projects: &[ReactorProject],
    ) -> Result<String, ReleasePhaseError> {
        let message = match self.kind {
            CommitKind::Release => format!(
                "prepare release {}",
                release_label(descriptor, reactor_projects, &self.tag_format)?
            ),
            CommitKind::Development => "prepare for next development iteration".to_owned(),
            CommitKind::Rollback => format!(
                "rollback the release of {}",
                release_label(descriptor, reactor_projects, &self.tag_format)?
            ),
        };
        Ok(comment(descriptor, &message))
    }
}

#[async_trait]
impl ReleasePhase for ScmCommitPhase {
    fn name(&self) -> &'static str {
        match self.kind {
            CommitKind::Release => "scm-commit-release",
            CommitKind::Development => "scm-commit-development",
            CommitKind::Rollback => "scm-commit-rollback",
        }
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let message = self.message(descriptor, reactor_projects)?;
        self.scm
            .commit(&descriptor.working_directory, &message)
            .await?;
        Ok(PhaseReport::line(format!("committed: {message}")))
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let message = self.message(descriptor, reactor_projects)?;
        Ok(PhaseReport::line(format!("would commit: {message}")))
    }
}

/// Tags the release revision and records the label on the descriptor.
pub struct ScmTagPhase {
    scm: Arc<dyn ScmClient>,
    tag_format: String,
}

impl ScmTagPhase {
    /// Creates the phase rendering default labels from `tag_format`.
    #[must_use]
    pub fn new(scm: Arc<dyn ScmClient>, tag_format: impl Into<String>) -> Self {
        Self {
            scm,
            tag_format: tag_format.into(),
        }
    }
}

#[async_trait]
impl ReleasePhase for ScmTagPhase {
    fn name(&self) -> &'static str {
        "scm-tag"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let label = release_label(descriptor, reactor_projects, &self.tag_format)?;
        let message = comment(descriptor, &format!("copy for tag {label}"));
        self.scm
            .tag(&descriptor.working_directory, &label, &message)
            .await?;
        descriptor.scm_release_label = Some(label.clone());
        Ok(PhaseReport::line(format!("tagged {label}")))
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let label = release_label(descriptor, reactor_projects, &self.tag_format)?;
        descriptor.scm_release_label = Some(label.clone());
        Ok(PhaseReport::line(format!("would tag {label}")))
    }
}

/// Removes the release tag recorded on the descriptor.
pub struct RemoveScmTagPhase {
    scm: Arc<dyn ScmClient>,
}

impl RemoveScmTagPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(scm: Arc<dyn ScmClient>) -> Self {
        Self { scm }
    }
}

#[async_trait]
impl ReleasePhase for RemoveScmTagPhase {
    fn name(&self) -> &'static str {
        "remove-scm-tag"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let Some(label) = descriptor.scm_release_label.clone() else {
            return Ok(PhaseReport::line("no release tag recorded"));
        };
        self.scm
            .remove_tag(&descriptor.working_directory, &label)
            .await?;
        Ok(PhaseReport::line(format!("removed tag {label}")))
    }
}
