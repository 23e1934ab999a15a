//! Phase catalogue for the prepare, perform and rollback pipelines.

mod descriptor;
mod goals;
mod reactor;
mod scm;
mod versions;
mod working_copy;

pub use descriptor::{EndReleasePhase, RemoveReleaseDescriptorPhase};
pub use goals::{RunPerformGoalsPhase, RunPreparationGoalsPhase};
pub use reactor::GenerateReactorProjectsPhase;
pub use scm::{CommitKind, RemoveScmTagPhase, ScmCommitPhase, ScmTagPhase};
pub use versions::{
    MapDevelopmentVersionsPhase, MapReleaseVersionsPhase, RestoreBackupManifestsPhase,
    RewriteManifestsPhase, VersionTarget,
};
pub use working_copy::{CheckoutProjectPhase, UpdateWorkingCopyPhase};

use super::ReleasePhaseError;
use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment, release_version_of},
    ports::{GoalRequest, ScmCredentials},
};
use camino::Utf8PathBuf;
use minijinja::{Environment, context};

/// Default tag label template.
pub const DEFAULT_TAG_FORMAT: &str = "{{ artifact }}-{{ version }}";

/// Default prefix for release commit messages.
pub const DEFAULT_COMMENT_PREFIX: &str = "[release] ";

/// Goals run by perform when the descriptor names none.
pub const DEFAULT_PERFORM_GOALS: &str = "deploy";

/// Property appended to perform arguments to activate the release profile.
pub const RELEASE_PROFILE_ARGUMENT: &str = "-DperformRelease=true";

fn root_project(reactor_projects: &[ReactorProject]) -> Result<&ReactorProject, ReleasePhaseError> {
    reactor_projects
        .first()
        .ok_or(ReleasePhaseError::NoReactorProjects)
}

fn credentials(descriptor: &ReleaseDescriptor) -> ScmCredentials {
    ScmCredentials::new(descriptor.scm_username.clone(), descriptor.scm_password.clone())
}

fn comment(descriptor: &ReleaseDescriptor, message: &str) -> String {
    let prefix = descriptor
        .scm_comment_prefix
        .as_deref()
        .unwrap_or(DEFAULT_COMMENT_PREFIX);
    format!("{prefix}{message}")
}

/// Returns the release label: the descriptor's explicit label, or the tag
/// template rendered for the root project's release version.
fn release_label(
    descriptor: &ReleaseDescriptor,
    reactor_projects: &[ReactorProject],
    tag_format: &str,
) -> Result<String, ReleasePhaseError> {
    if let Some(label) = descriptor.scm_release_label.as_deref() {
        return Ok(label.to_owned());
    }
    let root = root_project(reactor_projects)?;
    let version = descriptor
        .release_version(root.key())
        .map_or_else(|| release_version_of(root.version()), str::to_owned);
    Environment::new()
        .render_str(
            tag_format,
            context! {
                group => root.key().group(),
                artifact => root.key().artifact(),
                version => version,
            },
        )
        .map_err(|err| ReleasePhaseError::TemplateRender {
            template: tag_format.to_owned(),
            reason: err.to_string(),
        })
}

fn goal_request(
    descriptor: &ReleaseDescriptor,
    environment: &ReleaseEnvironment,
    directory: Utf8PathBuf,
    goals: String,
    arguments: Option<String>,
    default_executable: &str,
) -> GoalRequest {
    GoalRequest {
        directory,
        goals,
        arguments,
        executable: descriptor
            .executable
            .clone()
            .unwrap_or_else(|| default_executable.to_owned()),
        environment: descriptor.environment.clone(),
        tool_home: environment.tool_home().map(camino::Utf8Path::to_path_buf),
        settings: environment.settings().clone(),
        interactive: descriptor.interactive,
    }
}
