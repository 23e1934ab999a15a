//! Listener that records every callback for later inspection.

use crate::release::ports::ReleaseListener;
use std::sync::{Arc, Mutex};

/// One recorded listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// `goal_start` with the announced phases.
    GoalStart {
        /// Goal name.
        goal: String,
        /// Phase names in execution order.
        phases: Vec<String>,
    },
    /// `phase_start`.
    PhaseStart(String),
    /// `phase_end`.
    PhaseEnd,
    /// `phase_skip`.
    PhaseSkip(String),
    /// `goal_end`.
    GoalEnd,
    /// `error`.
    Error(String),
}

/// Thread-safe listener that keeps an ordered log of callbacks.
#[derive(Debug, Clone, Default)]
pub struct RecordingReleaseListener {
    events: Arc<Mutex<Vec<ListenerEvent>>>,
}

impl RecordingReleaseListener {
    /// Creates a listener with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded callbacks.
    #[must_use]
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the reasons passed to `error`, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::Error(reason) => Some(reason),
                _ => None,
            })
            .collect()
    }

    /// Returns the names of started phases, in order.
    #[must_use]
    pub fn started_phases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::PhaseStart(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Returns the names of skipped phases, in order.
    #[must_use]
    pub fn skipped_phases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ListenerEvent::PhaseSkip(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ListenerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ReleaseListener for RecordingReleaseListener {
    fn goal_start(&self, goal: &str, phases: &[String]) {
        self.record(ListenerEvent::GoalStart {
            goal: goal.to_owned(),
            phases: phases.to_vec(),
        });
    }

    fn phase_start(&self, name: &str) {
        self.record(ListenerEvent::PhaseStart(name.to_owned()));
    }

    fn phase_end(&self) {
        self.record(ListenerEvent::PhaseEnd);
    }

    fn phase_skip(&self, name: &str) {
        self.record(ListenerEvent::PhaseSkip(name.to_owned()));
    }

    fn goal_end(&self) {
        self.record(ListenerEvent::GoalEnd);
    }

    fn error(&self, reason: &str) {
        self.record(ListenerEvent::Error(reason.to_owned()));
    }
}
