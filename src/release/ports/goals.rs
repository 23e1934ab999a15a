//! Build-tool goal execution port.

use crate::release::domain::ToolSettings;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for goal execution.
pub type GoalExecutorResult<T> = Result<T, GoalExecutorError>;

/// One build-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalRequest {
    /// Directory the build tool runs in.
    pub directory: Utf8PathBuf,
    /// Whitespace-separated goals.
    pub goals: String,
    /// Extra arguments, passed through verbatim.
    pub arguments: Option<String>,
    /// Build-tool executable.
    pub executable: String,
    /// Environment variables for the invocation.
    pub environment: BTreeMap<String, String>,
    /// Build-tool installation directory.
    pub tool_home: Option<Utf8PathBuf>,
    /// Resolved tool settings.
    pub settings: ToolSettings,
    /// Whether the build tool may prompt for input.
    pub interactive: bool,
}

impl GoalRequest {
    /// Returns the goals split on whitespace.
    #[must_use]
    pub fn goal_list(&self) -> Vec<&str> {
        self.goals.split_whitespace().collect()
    }
}

/// Runs build-tool goals and returns their output.
#[async_trait]
pub trait GoalExecutor: Send + Sync {
    /// Runs the requested goals to completion.
    ///
    /// # Errors
    ///
    /// Returns [`GoalExecutorError::Failed`] when the build tool reports a
    /// failure and [`GoalExecutorError::Runtime`] when it cannot be started.
    async fn run_goals(&self, request: &GoalRequest) -> GoalExecutorResult<String>;
}

/// Errors returned by goal executors.
#[derive(Debug, Clone, Error)]
pub enum GoalExecutorError {
    /// The build tool ran and reported failure.
    #[error("goals '{goals}' failed ({status})")]
    Failed {
        /// Goals that were requested.
        goals: String,
        /// Exit status description.
        status: String,
        /// Captured output.
        output: String,
    },

    /// The build tool could not be started.
    #[error("goal execution error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl GoalExecutorError {
    /// Wraps a process start-up error.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
