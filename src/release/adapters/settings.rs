//! Tool settings sources.

use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, File, FileFormat};

use crate::release::{
    domain::ToolSettings,
    ports::{SettingsError, SettingsResult, SettingsSource},
};

/// Settings source returning a fixed value.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsSource {
    settings: ToolSettings,
}

impl StaticSettingsSource {
    /// Creates a source that always resolves to `settings`.
    #[must_use]
    pub const fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }
}

impl SettingsSource for StaticSettingsSource {
    fn resolve(&self) -> SettingsResult<ToolSettings> {
        Ok(self.settings.clone())
    }
}

/// Settings source that re-reads a TOML file on every resolution.
///
/// ```toml
/// local_repository = "/var/cache/artifacts"
/// offline = false
/// profiles = ["release"]
/// ```
#[derive(Debug, Clone)]
pub struct FileSettingsSource {
    path: Utf8PathBuf,
}

impl FileSettingsSource {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the settings file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl SettingsSource for FileSettingsSource {
    fn resolve(&self) -> SettingsResult<ToolSettings> {
        Config::builder()
            .add_source(File::new(self.path.as_str(), FileFormat::Toml).required(true))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(SettingsError::load)
    }
}
