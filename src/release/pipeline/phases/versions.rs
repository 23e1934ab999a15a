//! Version mapping and manifest rewriting phases.

use async_trait::async_trait;
use std::sync::Arc;

use super::root_project;
use crate::release::{
    domain::{
        ReactorProject, ReleaseDescriptor, ReleaseEnvironment, next_development_version,
        release_version_of,
    },
    pipeline::{PhaseReport, PhaseResult, ReleasePhase, ReleasePhaseError},
    ports::ProjectManifests,
};

/// Fills in the release version of every module without an explicit one.
///
/// Modules default to their current version without the snapshot suffix, or
/// to the root's release version when submodules are auto-versioned.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapReleaseVersionsPhase;

fn map_release_versions(
    descriptor: &mut ReleaseDescriptor,
    reactor_projects: &[ReactorProject],
) -> PhaseResult {
    let root = root_project(reactor_projects)?;
    let root_release = descriptor
        .release_version(root.key())
        .map_or_else(|| release_version_of(root.version()), str::to_owned);

    let mut report = PhaseReport::new();
    for project in reactor_projects {
        let version = descriptor
            .release_version(project.key())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if descriptor.auto_version_submodules {
                    root_release.clone()
                } else {
                    release_version_of(project.version())
                }
            });
        report.push(format!("{} release {version}", project.key()));
        descriptor
            .release_versions
            .insert(project.key().clone(), version);
    }
    Ok(report)
}

#[async_trait]
impl ReleasePhase for MapReleaseVersionsPhase {
    fn name(&self) -> &'static str {
        "map-release-versions"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        map_release_versions(descriptor, reactor_projects)
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        map_release_versions(descriptor, reactor_projects)
    }
}

/// Fills in the next development version of every module without an
/// explicit one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapDevelopmentVersionsPhase;

fn map_development_versions(
    descriptor: &mut ReleaseDescriptor,
    reactor_projects: &[ReactorProject],
) -> PhaseResult {
    let release_of = |descriptor: &ReleaseDescriptor, project: &ReactorProject| {
        descriptor
            .release_version(project.key())
            .map_or_else(|| release_version_of(project.version()), str::to_owned)
    };
    let root = root_project(reactor_projects)?;
    let root_development = descriptor
        .development_version(root.key())
        .map_or_else(
            || next_development_version(&release_of(descriptor, root)),
            str::to_owned,
        );

    let mut report = PhaseReport::new();
    for project in reactor_projects {
        let version = descriptor
            .development_version(project.key())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if descriptor.auto_version_submodules {
                    root_development.clone()
                } else {
                    next_development_version(&release_of(descriptor, project))
                }
            });
        report.push(format!("{} development {version}", project.key()));
        descriptor
            .development_versions
            .insert(project.key().clone(), version);
    }
    Ok(report)
}

#[async_trait]
impl ReleasePhase for MapDevelopmentVersionsPhase {
    fn name(&self) -> &'static str {
        "map-development-versions"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        map_development_versions(descriptor, reactor_projects)
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        map_development_versions(descriptor, reactor_projects)
    }
}

/// Which version map a manifest rewrite applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionTarget {
    /// Release versions; a pristine backup is taken first.
    Release,
    /// Next development versions.
    Development,
}

/// Rewrites every module manifest to its mapped version.
pub struct RewriteManifestsPhase {
    manifests: Arc<dyn ProjectManifests>,
    target: VersionTarget,
}

impl RewriteManifestsPhase {
    /// Creates the phase for the given version map.
    #[must_use]
    pub fn new(manifests: Arc<dyn ProjectManifests>, target: VersionTarget) -> Self {
        Self { manifests, target }
    }

    fn planned<'a>(
        &self,
        descriptor: &'a ReleaseDescriptor,
        reactor_projects: &'a [ReactorProject],
    ) -> Result<Vec<(&'a ReactorProject, &'a str)>, ReleasePhaseError> {
        reactor_projects
            .iter()
            .map(|project| {
                let (version, kind) = match self.target {
                    VersionTarget::Release => (descriptor.release_version(project.key()), "release"),
                    VersionTarget::Development => (
                        descriptor.development_version(project.key()),
                        "development",
                    ),
                };
                version
                    .map(|found| (project, found))
                    .ok_or_else(|| ReleasePhaseError::MissingVersion {
                        module: project.key().clone(),
                        kind,
                    })
            })
            .collect()
    }
}

#[async_trait]
impl ReleasePhase for RewriteManifestsPhase {
    fn name(&self) -> &'static str {
        match self.target {
            VersionTarget::Release => "rewrite-manifests-for-release",
            VersionTarget::Development => "rewrite-manifests-for-development",
        }
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let mut report = PhaseReport::new();
        for (project, version) in self.planned(descriptor, reactor_projects)? {
            if self.target == VersionTarget::Release {
                self.manifests.backup(project.manifest_path())?;
            }
            self.manifests.set_version(project.manifest_path(), version)?;
            report.push(format!("{} set to {version}", project.manifest_path()));
        }
        Ok(report)
    }

    async fn simulate(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let mut report = PhaseReport::new();
        for (project, version) in self.planned(descriptor, reactor_projects)? {
            report.push(format!("would set {} to {version}", project.manifest_path()));
        }
        Ok(report)
    }
}

/// Restores every module manifest from its release backup and deletes the
/// backups.
pub struct RestoreBackupManifestsPhase {
    manifests: Arc<dyn ProjectManifests>,
}

impl RestoreBackupManifestsPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(manifests: Arc<dyn ProjectManifests>) -> Self {
        Self { manifests }
    }
}

#[async_trait]
impl ReleasePhase for RestoreBackupManifestsPhase {
    fn name(&self) -> &'static str {
        "restore-backup-manifests"
    }

    async fn execute(
        &self,
        _descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        let mut report = PhaseReport::new();
        for project in reactor_projects.iter() {
            if self.manifests.restore_backup(project.manifest_path())? {
                report.push(format!("restored {}", project.manifest_path()));
            } else {
                report.push(format!("no backup for {}", project.manifest_path()));
            }
        }
        Ok(report)
    }
}
