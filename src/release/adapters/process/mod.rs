//! Adapters that drive system processes: `git` and the build tool.

mod command_line;
mod git;
mod goals;

pub use command_line::{render_command_line, shell_escape, split_arguments};
pub use git::GitScmClient;
pub use goals::CommandGoalExecutor;
