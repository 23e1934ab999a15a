//! Per-task execution environment handed to the release engine.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Build-tool settings resolved freshly for every task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Local artifact repository the build tool should use.
    pub local_repository: Option<Utf8PathBuf>,
    /// Whether the build tool runs without network access.
    pub offline: bool,
    /// Profiles activated for every invocation.
    pub profiles: Vec<String>,
}

/// Environment constructed for one task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEnvironment {
    executor_id: String,
    tool_home: Option<Utf8PathBuf>,
    settings: ToolSettings,
}

impl ReleaseEnvironment {
    /// Creates an environment for the given execution mode.
    #[must_use]
    pub fn new(executor_id: impl Into<String>, settings: ToolSettings) -> Self {
        Self {
            executor_id: executor_id.into(),
            tool_home: None,
            settings,
        }
    }

    /// Sets the build-tool installation directory.
    #[must_use]
    pub fn with_tool_home(mut self, tool_home: Option<Utf8PathBuf>) -> Self {
        self.tool_home = tool_home;
        self
    }

    /// Returns the execution-mode identifier.
    #[must_use]
    pub fn executor_id(&self) -> &str {
        &self.executor_id
    }

    /// Returns the build-tool installation directory, if configured.
    #[must_use]
    pub fn tool_home(&self) -> Option<&Utf8Path> {
        self.tool_home.as_deref()
    }

    /// Returns the resolved tool settings.
    #[must_use]
    pub const fn settings(&self) -> &ToolSettings {
        &self.settings
    }
}
