//! Working copy phases: initial checkout and perform checkout of the tag.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;
use std::sync::Arc;

use super::credentials;
use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment},
    pipeline::{PhaseReport, PhaseResult, ReleasePhase, ReleasePhaseError},
    ports::{CheckoutRequest, ScmClient},
};

/// Returns `true` when `directory` is missing or has no entries.
fn needs_checkout(directory: &Utf8Path) -> Result<bool, ReleasePhaseError> {
    match Dir::open_ambient_dir(directory, ambient_authority()) {
        Ok(dir) => {
            let mut entries = dir.entries().map_err(ReleasePhaseError::io)?;
            Ok(entries.next().is_none())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(ReleasePhaseError::io(err)),
    }
}

fn remove_directory(directory: &Utf8Path) -> Result<(), ReleasePhaseError> {
    let (Some(parent), Some(name)) = (directory.parent(), directory.file_name()) else {
        return Ok(());
    };
    let parent_dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(ReleasePhaseError::io(err)),
    };
    match parent_dir.remove_dir_all(name) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ReleasePhaseError::io(err)),
    }
}

/// Ensures the working directory holds a checkout of the descriptor's SCM
/// URL. An existing, non-empty directory is left untouched.
pub struct UpdateWorkingCopyPhase {
    scm: Arc<dyn ScmClient>,
}

impl UpdateWorkingCopyPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(scm: Arc<dyn ScmClient>) -> Self {
        Self { scm }
    }
}

#[async_trait]
impl ReleasePhase for UpdateWorkingCopyPhase {
    fn name(&self) -> &'static str {
        "update-working-copy"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let directory = descriptor.working_directory.clone();
        if !needs_checkout(&directory)? {
            return Ok(PhaseReport::line(format!(
                "working copy present in {directory}"
            )));
        }
        let url = descriptor
            .scm_source_url
            .clone()
            .ok_or(ReleasePhaseError::MissingScmUrl)?;
        let request =
            CheckoutRequest::new(url.clone(), directory.clone()).with_credentials(credentials(descriptor));
        self.scm.checkout(&request).await?;
        Ok(PhaseReport::line(format!("checked out {url} into {directory}")))
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let directory = &descriptor.working_directory;
        if needs_checkout(directory)? {
            let url = descriptor
                .scm_source_url
                .as_deref()
                .ok_or(ReleasePhaseError::MissingScmUrl)?;
            return Ok(PhaseReport::line(format!(
                "would check out {url} into {directory}"
            )));
        }
        Ok(PhaseReport::line(format!(
            "working copy present in {directory}"
        )))
    }
}

/// Checks out the release tag into the perform checkout directory.
///
/// A checkout directory distinct from the working directory is replaced so
/// every perform builds from a clean copy of the tag.
pub struct CheckoutProjectPhase {
    scm: Arc<dyn ScmClient>,
}

impl CheckoutProjectPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(scm: Arc<dyn ScmClient>) -> Self {
        Self { scm }
    }
}

#[async_trait]
impl ReleasePhase for CheckoutProjectPhase {
    fn name(&self) -> &'static str {
        "checkout-project-from-scm"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let target = descriptor.checkout_directory().to_path_buf();
        if target != descriptor.working_directory {
            remove_directory(&target)?;
        } else if !needs_checkout(&target)? {
            return Ok(PhaseReport::line(format!(
                "building from working copy {target}"
            )));
        }

        let url = descriptor
            .scm_source_url
            .clone()
            .ok_or(ReleasePhaseError::MissingScmUrl)?;
        let tag = descriptor
            .scm_release_label
            .clone()
            .ok_or(ReleasePhaseError::MissingReleaseLabel)?;
        let request = CheckoutRequest::new(url, target.clone())
            .with_tag(Some(tag.clone()))
            .with_credentials(credentials(descriptor));
        self.scm.checkout(&request).await?;
        Ok(PhaseReport::line(format!("checked out tag {tag} into {target}")))
    }
}
