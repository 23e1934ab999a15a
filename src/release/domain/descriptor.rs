//! The release descriptor: everything a release operation needs.

use super::{ModuleKey, ProjectDescriptor, ReleaseProperties};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest file name used when a descriptor does not override it.
pub const DEFAULT_MANIFEST_FILE_NAME: &str = "project.toml";

/// Build-tool property that redirects the local artifact repository.
pub const LOCAL_REPOSITORY_PROPERTY: &str = "maven.repo.local";

/// Full parameter set for a release operation.
///
/// Created fresh for prepare, then either kept in memory between prepare and
/// perform or reconstructed from the copy persisted in the working directory.
/// Only pipeline phases mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDescriptor {
    /// Directory holding the project checkout the release is prepared in.
    pub working_directory: Utf8PathBuf,
    /// Source-control URL of the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_source_url: Option<String>,
    /// SCM user name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_username: Option<String>,
    /// SCM password override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_password: Option<String>,
    /// Tag label for the release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_release_label: Option<String>,
    /// Base location for tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_tag_base: Option<String>,
    /// Prefix for release commit messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_comment_prefix: Option<String>,
    /// Whether the SCM requires an explicit edit before modifying files.
    pub scm_use_edit_mode: bool,
    /// Release version per module.
    pub release_versions: BTreeMap<ModuleKey, String>,
    /// Next development version per module.
    pub development_versions: BTreeMap<ModuleKey, String>,
    /// Goals run while preparing the release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_goals: Option<String>,
    /// Goals run while performing the release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perform_goals: Option<String>,
    /// Extra command-line arguments for the build tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_arguments: Option<String>,
    /// Whether rewritten manifests get a schema declaration.
    pub add_schema: bool,
    /// Whether submodules inherit the root project version.
    pub auto_version_submodules: bool,
    /// Whether perform goals run with the release profile.
    pub use_release_profile: bool,
    /// Whether the build tool may prompt; always `false` under automation.
    pub interactive: bool,
    /// Environment variables passed to build-tool invocations.
    pub environment: BTreeMap<String, String>,
    /// Build-tool executable override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    /// User who requested the release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_by: Option<String>,
    /// Directory the release tag is checked out into for perform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_directory: Option<Utf8PathBuf>,
    /// Manifest file name override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_file_name: Option<String>,
    /// Last prepare phase that completed, used to resume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_phase: Option<String>,
}

impl ReleaseDescriptor {
    /// Creates a partial descriptor that only names its working directory.
    ///
    /// Partial descriptors are the lookup key for the descriptor store.
    #[must_use]
    pub fn new(working_directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            working_directory: working_directory.into(),
            use_release_profile: true,
            ..Self::default()
        }
    }

    /// Builds the descriptor for a prepare request.
    ///
    /// Project metadata supplies the SCM location; request properties supply
    /// tag, goal, argument and credential overrides. A local repository
    /// override on the project is appended to the additional arguments, and
    /// the descriptor is always non-interactive.
    #[must_use]
    pub fn for_prepare(
        project: &ProjectDescriptor,
        properties: &ReleaseProperties,
        working_directory: impl Into<Utf8PathBuf>,
    ) -> Self {
        let mut descriptor = Self::new(working_directory);
        descriptor.scm_source_url = Some(project.scm_url().to_owned());
        descriptor.scm_release_label.clone_from(&properties.scm_tag);
        descriptor.scm_tag_base.clone_from(&properties.scm_tag_base);
        descriptor
            .preparation_goals
            .clone_from(&properties.preparation_goals);
        descriptor.additional_arguments.clone_from(&properties.arguments);
        descriptor.add_schema = properties.add_schema;
        descriptor.auto_version_submodules = properties.auto_version_submodules;
        if properties.use_edit_mode {
            descriptor.scm_use_edit_mode = true;
        }

        if let Some(repository) = project.local_repository() {
            descriptor.append_argument(&format!(
                "\"-D{LOCAL_REPOSITORY_PROPERTY}={repository}\""
            ));
        }

        descriptor.scm_username.clone_from(&properties.scm_username);
        descriptor.scm_password.clone_from(&properties.scm_password);
        descriptor
            .scm_comment_prefix
            .clone_from(&properties.scm_comment_prefix);
        if let Some(enabled) = properties.use_release_profile {
            descriptor.use_release_profile = enabled;
        }

        descriptor.interactive = false;
        descriptor.release_by.clone_from(&properties.release_by);
        descriptor
    }

    /// Sets explicit release versions per module.
    #[must_use]
    pub fn with_release_versions(mut self, versions: BTreeMap<ModuleKey, String>) -> Self {
        self.release_versions = versions;
        self
    }

    /// Sets explicit development versions per module.
    #[must_use]
    pub fn with_development_versions(mut self, versions: BTreeMap<ModuleKey, String>) -> Self {
        self.development_versions = versions;
        self
    }

    /// Sets the environment passed to build-tool invocations.
    #[must_use]
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the build-tool executable override.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Sets the source-control URL.
    #[must_use]
    pub fn with_scm_source_url(mut self, url: impl Into<String>) -> Self {
        self.scm_source_url = Some(url.into());
        self
    }

    /// Appends an argument to the additional arguments, space-separated.
    pub fn append_argument(&mut self, argument: &str) {
        self.additional_arguments = Some(match self.additional_arguments.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{existing} {argument}"),
            _ => argument.to_owned(),
        });
    }

    /// Returns the manifest file name, falling back to the default.
    #[must_use]
    pub fn manifest_file_name(&self) -> &str {
        self.manifest_file_name
            .as_deref()
            .unwrap_or(DEFAULT_MANIFEST_FILE_NAME)
    }

    /// Returns the root manifest path inside the working directory.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.working_directory.join(self.manifest_file_name())
    }

    /// Returns the checkout directory used by perform, defaulting to the
    /// working directory.
    #[must_use]
    pub fn checkout_directory(&self) -> &Utf8Path {
        self.checkout_directory
            .as_deref()
            .unwrap_or(&self.working_directory)
    }

    /// Returns the release version recorded for a module.
    #[must_use]
    pub fn release_version(&self, key: &ModuleKey) -> Option<&str> {
        self.release_versions.get(key).map(String::as_str)
    }

    /// Returns the development version recorded for a module.
    #[must_use]
    pub fn development_version(&self, key: &ModuleKey) -> Option<&str> {
        self.development_versions.get(key).map(String::as_str)
    }

    /// Overlays the fields a partial descriptor set on top of this persisted
    /// descriptor.
    ///
    /// The working directory always comes from the partial descriptor so a
    /// moved working directory is honoured.
    #[must_use]
    pub fn merged_with(mut self, partial: &Self) -> Self {
        self.working_directory.clone_from(&partial.working_directory);
        if partial.scm_source_url.is_some() {
            self.scm_source_url.clone_from(&partial.scm_source_url);
        }
        if partial.executable.is_some() {
            self.executable.clone_from(&partial.executable);
        }
        if partial.manifest_file_name.is_some() {
            self.manifest_file_name.clone_from(&partial.manifest_file_name);
        }
        self
    }
}
