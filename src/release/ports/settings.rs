//! Tool settings resolution port.

use crate::release::domain::ToolSettings;
use std::sync::Arc;
use thiserror::Error;

/// Result type for settings resolution.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Resolves build-tool settings; called once per executed task.
pub trait SettingsSource: Send + Sync {
    /// Resolves the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the settings cannot be loaded.
    fn resolve(&self) -> SettingsResult<ToolSettings>;
}

/// Errors returned while resolving tool settings.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    /// The settings source could not be loaded.
    #[error("failed to load tool settings: {0}")]
    Load(Arc<dyn std::error::Error + Send + Sync>),
}

impl SettingsError {
    /// Wraps a loader error.
    pub fn load(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Load(Arc::new(err))
    }
}
