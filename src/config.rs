//! Runtime configuration for the release orchestrator.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `MARSHAL_*` environment variables (for example `MARSHAL_TAG_FORMAT`).

use crate::release::{
    adapters::{
        process::GitScmClient,
        settings::{FileSettingsSource, StaticSettingsSource},
    },
    domain::{DEFAULT_MANIFEST_FILE_NAME, ToolSettings},
    pipeline::{PipelineCollaborators, phases::DEFAULT_TAG_FORMAT},
    ports::{ReleaseEngine, SettingsSource},
    services::{DEFAULT_EXECUTOR_ID, ReleaseTaskExecutor},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use mockable::Clock;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of the environment variables read by [`ReleaseConfig::load`].
pub const ENV_PREFIX: &str = "MARSHAL";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ReleaseConfigError {
    /// A source could not be read or deserialised.
    #[error("failed to load release configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Orchestrator settings shared by the pipeline, executors and tracing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Executor identifier recorded on each release environment.
    pub executor_id: String,
    /// Build-tool installation directory.
    pub tool_home: Option<Utf8PathBuf>,
    /// Manifest file name looked up in working copies.
    pub manifest_file_name: String,
    /// Build-tool executable used without a per-release override.
    pub default_executable: String,
    /// Tag label template.
    pub tag_format: String,
    /// Tool settings file re-read for every task.
    pub settings_file: Option<Utf8PathBuf>,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Push commits and tags after creating them.
    pub push_changes: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            executor_id: DEFAULT_EXECUTOR_ID.to_owned(),
            tool_home: None,
            manifest_file_name: DEFAULT_MANIFEST_FILE_NAME.to_owned(),
            default_executable: "mvn".to_owned(),
            tag_format: DEFAULT_TAG_FORMAT.to_owned(),
            settings_file: None,
            log_filter: "info".to_owned(),
            push_changes: false,
        }
    }
}

impl ReleaseConfig {
    /// Loads configuration, layering `path` (when given) and the
    /// environment over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseConfigError::Load`] when the file is missing or a
    /// value has the wrong type.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ReleaseConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = path {
            builder = builder.add_source(File::new(file.as_str(), FileFormat::Toml).required(true));
        }
        let loaded = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(loaded)
    }

    /// Returns the settings source selected by `settings_file`.
    #[must_use]
    pub fn settings_source(&self) -> Arc<dyn SettingsSource> {
        self.settings_file.as_ref().map_or_else(
            || {
                Arc::new(StaticSettingsSource::new(ToolSettings::default()))
                    as Arc<dyn SettingsSource>
            },
            |path| Arc::new(FileSettingsSource::new(path.clone())) as Arc<dyn SettingsSource>,
        )
    }

    /// Applies the tag format and default executable to pipeline
    /// collaborators.
    #[must_use]
    pub fn configure_pipeline(&self, collaborators: PipelineCollaborators) -> PipelineCollaborators {
        collaborators
            .with_tag_format(self.tag_format.clone())
            .with_default_executable(self.default_executable.clone())
    }

    /// Applies the executor identifier and tool home to a task executor.
    #[must_use]
    pub fn configure_executor<E, C>(
        &self,
        executor: ReleaseTaskExecutor<E, C>,
    ) -> ReleaseTaskExecutor<E, C>
    where
        E: ReleaseEngine + ?Sized,
        C: Clock + Send + Sync,
    {
        executor
            .with_executor_id(self.executor_id.clone())
            .with_tool_home(self.tool_home.clone())
    }

    /// Returns a `git` client honouring `push_changes`.
    #[must_use]
    pub fn git_client(&self) -> GitScmClient {
        GitScmClient::new().with_push_changes(self.push_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::ReleaseConfig;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_the_documented_values() {
        let config = ReleaseConfig::default();

        assert_eq!(config.executor_id, "forked-path");
        assert_eq!(config.manifest_file_name, "project.toml");
        assert_eq!(config.default_executable, "mvn");
        assert_eq!(config.tag_format, "{{ artifact }}-{{ version }}");
        assert_eq!(config.log_filter, "info");
        assert!(!config.push_changes);
        assert!(config.settings_file.is_none());
    }

    #[rstest]
    fn file_values_override_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(temp.path().join("marshal.toml"))
            .expect("utf8 temp path");
        std::fs::write(
            &path,
            "default_executable = \"mvnw\"\npush_changes = true\ntag_format = \"v{{ version }}\"\n",
        )
        .expect("write config");

        let config = ReleaseConfig::load(Some(&path)).expect("config loads");

        assert_eq!(config.default_executable, "mvnw");
        assert!(config.push_changes);
        assert_eq!(config.tag_format, "v{{ version }}");
        assert_eq!(config.executor_id, "forked-path");
    }

    #[rstest]
    fn git_client_pushes_only_when_configured() {
        let quiet = ReleaseConfig::default().git_client();
        let pushing = ReleaseConfig {
            push_changes: true,
            ..ReleaseConfig::default()
        }
        .git_client();

        assert!(format!("{quiet:?}").contains("push_changes: false"));
        assert!(format!("{pushing:?}").contains("push_changes: true"));
    }

    #[rstest]
    fn missing_file_is_an_error() {
        let result = ReleaseConfig::load(Some(camino::Utf8Path::new("/nonexistent/marshal.toml")));

        assert!(result.is_err());
    }
}
