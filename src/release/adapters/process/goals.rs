//! Goal executor that runs the build tool as a child process.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use tokio::process::Command;
use tracing::info;

use super::command_line::{render_command_line, split_arguments};
use crate::release::{
    domain::LOCAL_REPOSITORY_PROPERTY,
    ports::{GoalExecutor, GoalExecutorError, GoalExecutorResult, GoalRequest},
};

/// Runs goals with the requested executable.
///
/// The executable resolves to `<tool_home>/bin/<executable>` when a tool home
/// is set. Non-interactive requests add `--batch-mode`; offline settings add
/// `--offline`; active profiles and the settings' local repository are passed
/// as properties unless the arguments already override the repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandGoalExecutor;

impl CommandGoalExecutor {
    /// Creates the executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn resolve_program(request: &GoalRequest) -> Utf8PathBuf {
    request.tool_home.as_ref().map_or_else(
        || Utf8PathBuf::from(&request.executable),
        |home| home.join("bin").join(&request.executable),
    )
}

fn build_arguments(request: &GoalRequest) -> Vec<String> {
    let mut args: Vec<String> = request.goal_list().into_iter().map(str::to_owned).collect();
    let extra = request
        .arguments
        .as_deref()
        .map(split_arguments)
        .unwrap_or_default();

    if !request.interactive {
        args.push("--batch-mode".to_owned());
    }
    if request.settings.offline {
        args.push("--offline".to_owned());
    }
    if !request.settings.profiles.is_empty() {
        args.push(format!("-P{}", request.settings.profiles.join(",")));
    }
    let repository_overridden = extra
        .iter()
        .any(|arg| arg.starts_with(&format!("-D{LOCAL_REPOSITORY_PROPERTY}=")));
    if let Some(repository) = request
        .settings
        .local_repository
        .as_ref()
        .filter(|_| !repository_overridden)
    {
        args.push(format!("-D{LOCAL_REPOSITORY_PROPERTY}={repository}"));
    }
    args.extend(extra);
    args
}

#[async_trait]
impl GoalExecutor for CommandGoalExecutor {
    async fn run_goals(&self, request: &GoalRequest) -> GoalExecutorResult<String> {
        let program = resolve_program(request);
        let args = build_arguments(request);
        let command_line = render_command_line(program.as_str(), &args);
        info!(directory = %request.directory, command = %command_line, "running goals");

        let output = Command::new(program.as_str())
            .args(&args)
            .current_dir(request.directory.as_std_path())
            .envs(&request.environment)
            .output()
            .await
            .map_err(GoalExecutorError::runtime)?;

        let captured = format!(
            "$ {command_line}\n{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if output.status.success() {
            Ok(captured)
        } else {
            Err(GoalExecutorError::Failed {
                goals: request.goals.clone(),
                status: output.status.to_string(),
                output: captured,
            })
        }
    }
}
