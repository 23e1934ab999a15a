//! Release operation kinds, statuses, engine outcomes and stored results.

use super::{ParseReleaseValueError, TaskRunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of release operation, one per task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseOperation {
    /// Rewrites versions, commits and tags.
    Prepare,
    /// Checks out the tag and runs the release goals.
    Perform,
    /// Restores the pre-release state of the working directory.
    Rollback,
}

impl ReleaseOperation {
    /// All operation kinds, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Prepare, Self::Perform, Self::Rollback];

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Perform => "perform",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ReleaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ReleaseOperation {
    type Error = ParseReleaseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prepare" => Ok(Self::Prepare),
            "perform" => Ok(Self::Perform),
            "rollback" => Ok(Self::Rollback),
            _ => Err(ParseReleaseValueError {
                kind: "operation",
                value: value.to_owned(),
            }),
        }
    }
}

/// Terminal status of a release operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    /// Every phase completed.
    Success,
    /// A phase failed or the task could not run.
    Failure,
}

impl ReleaseStatus {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    /// Returns `true` for [`ReleaseStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ReleaseStatus {
    type Error = ParseReleaseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(ParseReleaseValueError {
                kind: "status",
                value: value.to_owned(),
            }),
        }
    }
}

/// Summary a release engine returns after running a phase sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    status: ReleaseStatus,
    output: Vec<String>,
    error: Option<String>,
    failed_phase: Option<String>,
}

impl ReleaseOutcome {
    /// Creates a successful outcome with the collected output.
    #[must_use]
    pub const fn success(output: Vec<String>) -> Self {
        Self {
            status: ReleaseStatus::Success,
            output,
            error: None,
            failed_phase: None,
        }
    }

    /// Creates a failed outcome naming the phase that failed.
    #[must_use]
    pub fn failure(
        output: Vec<String>,
        failed_phase: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: ReleaseStatus::Failure,
            output,
            error: Some(error.into()),
            failed_phase: Some(failed_phase.into()),
        }
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> ReleaseStatus {
        self.status
    }

    /// Returns the output lines collected from the phases.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the name of the failed phase, if any.
    #[must_use]
    pub fn failed_phase(&self) -> Option<&str> {
        self.failed_phase.as_deref()
    }

    /// Returns `true` when every phase succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Outcome of one executed task, stored under its release id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResult {
    operation: ReleaseOperation,
    run_id: TaskRunId,
    status: ReleaseStatus,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    output: String,
    error: Option<String>,
}

impl ReleaseResult {
    /// Opens a result at task start. The status stays
    /// [`ReleaseStatus::Failure`] until the task completes successfully.
    #[must_use]
    pub const fn started(
        operation: ReleaseOperation,
        run_id: TaskRunId,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            operation,
            run_id,
            status: ReleaseStatus::Failure,
            start_time,
            end_time: None,
            output: String::new(),
            error: None,
        }
    }

    /// Finalises the result from an engine outcome.
    #[must_use]
    pub fn completed(mut self, outcome: &ReleaseOutcome, end_time: DateTime<Utc>) -> Self {
        self.status = outcome.status();
        self.output = outcome.output().join("\n");
        self.error = outcome.error().map(str::to_owned);
        self.end_time = Some(end_time);
        self
    }

    /// Finalises the result as a failure with the given reason.
    #[must_use]
    pub fn failed(mut self, reason: impl Into<String>, end_time: DateTime<Utc>) -> Self {
        self.status = ReleaseStatus::Failure;
        self.error = Some(reason.into());
        self.end_time = Some(end_time);
        self
    }

    /// Returns the operation that produced this result.
    #[must_use]
    pub const fn operation(&self) -> ReleaseOperation {
        self.operation
    }

    /// Returns the run identifier of the task.
    #[must_use]
    pub const fn run_id(&self) -> TaskRunId {
        self.run_id
    }

    /// Returns the terminal status.
    #[must_use]
    pub const fn status(&self) -> ReleaseStatus {
        self.status
    }

    /// Returns when the task started.
    #[must_use]
    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns when the task finished, once finalised.
    #[must_use]
    pub const fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Returns the accumulated output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the failure cause, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
