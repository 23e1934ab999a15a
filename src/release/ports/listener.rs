//! Listener callback surface for release progress.

/// Observer notified at goal and phase boundaries and on failure.
///
/// Callbacks run synchronously on the worker executing the task, inline with
/// phase execution, so implementations must return quickly.
pub trait ReleaseListener: Send + Sync {
    /// A goal (operation) is starting with the listed phases.
    fn goal_start(&self, goal: &str, phases: &[String]);

    /// A phase is starting.
    fn phase_start(&self, name: &str);

    /// The current phase finished successfully.
    fn phase_end(&self);

    /// A phase was skipped because a resumed release already completed it.
    fn phase_skip(&self, name: &str);

    /// The goal finished successfully.
    fn goal_end(&self);

    /// The task failed; called at most once per task.
    fn error(&self, reason: &str);
}
