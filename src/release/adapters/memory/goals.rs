//! Goal executor that records requests instead of running a build tool.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::release::ports::{GoalExecutor, GoalExecutorError, GoalExecutorResult, GoalRequest};

#[derive(Debug, Default)]
struct GoalState {
    requests: Vec<GoalRequest>,
    failing_goals: BTreeSet<String>,
}

/// Thread-safe recording goal executor.
///
/// Requests naming a goal registered with [`Self::fail_on`] fail; every other
/// request succeeds with a one-line summary of the invocation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGoalExecutor {
    state: Arc<RwLock<GoalState>>,
}

impl InMemoryGoalExecutor {
    /// Creates an executor with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every request that includes `goal` fail.
    #[must_use]
    pub fn fail_on(self, goal: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.failing_goals.insert(goal.into());
        }
        self
    }

    /// Returns the recorded requests, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<GoalRequest> {
        self.state
            .read()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }
}

fn summarise(request: &GoalRequest) -> String {
    let arguments = request
        .arguments
        .as_deref()
        .map(|args| format!(" {args}"))
        .unwrap_or_default();
    format!(
        "[{}] {} {}{arguments}",
        request.directory, request.executable, request.goals
    )
}

#[async_trait]
impl GoalExecutor for InMemoryGoalExecutor {
    async fn run_goals(&self, request: &GoalRequest) -> GoalExecutorResult<String> {
        let mut state = self.state.write().map_err(|err| {
            GoalExecutorError::runtime(std::io::Error::other(err.to_string()))
        })?;
        state.requests.push(request.clone());
        let output = summarise(request);
        let failing = request
            .goal_list()
            .into_iter()
            .any(|goal| state.failing_goals.contains(goal));
        if failing {
            return Err(GoalExecutorError::Failed {
                goals: request.goals.clone(),
                status: "exit status: 1".to_owned(),
                output,
            });
        }
        Ok(output)
    }
}
