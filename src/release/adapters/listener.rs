//! Default listener that reports release progress through `tracing`.

use crate::release::{domain::ReleaseId, ports::ReleaseListener};
use tracing::{error, info};

/// Listener used when a caller does not supply one.
#[derive(Debug, Clone, Default)]
pub struct LoggingReleaseListener {
    release_id: Option<ReleaseId>,
}

impl LoggingReleaseListener {
    /// Creates a listener with no release context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a listener that tags every event with the release id.
    #[must_use]
    pub const fn for_release(release_id: ReleaseId) -> Self {
        Self {
            release_id: Some(release_id),
        }
    }

    fn release(&self) -> &str {
        self.release_id.as_ref().map_or("-", ReleaseId::as_str)
    }
}

impl ReleaseListener for LoggingReleaseListener {
    fn goal_start(&self, goal: &str, phases: &[String]) {
        info!(release_id = self.release(), goal, phases = ?phases, "release goal started");
    }

    fn phase_start(&self, name: &str) {
        info!(release_id = self.release(), phase = name, "release phase started");
    }

    fn phase_end(&self) {
        info!(release_id = self.release(), "release phase finished");
    }

    fn phase_skip(&self, name: &str) {
        info!(release_id = self.release(), phase = name, "release phase skipped");
    }

    fn goal_end(&self) {
        info!(release_id = self.release(), "release goal finished");
    }

    fn error(&self, reason: &str) {
        error!(release_id = self.release(), reason, "release failed");
    }
}
