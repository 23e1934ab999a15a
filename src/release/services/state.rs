//! Process-wide release state shared by the manager and the workers.

use crate::release::{
    domain::{ReleaseDescriptor, ReleaseId, ReleaseResult},
    ports::ReleaseListener,
};
use dashmap::DashMap;
use std::{collections::BTreeMap, sync::Arc};

/// Concurrency-safe maps of prepared releases, task results and listener
/// registrations.
///
/// Constructed once at startup and shared by handle; every access goes
/// through a sharded [`DashMap`], so admission on caller threads and result
/// publication on worker threads never lose updates.
#[derive(Default)]
pub struct ReleaseState {
    prepared: DashMap<ReleaseId, ReleaseDescriptor>,
    results: DashMap<ReleaseId, ReleaseResult>,
    listeners: DashMap<ReleaseId, Arc<dyn ReleaseListener>>,
}

impl ReleaseState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the descriptor of a successfully prepared release, replacing
    /// any earlier one.
    pub fn insert_prepared(&self, release_id: ReleaseId, descriptor: ReleaseDescriptor) {
        self.prepared.insert(release_id, descriptor);
    }

    /// Forgets a prepared release, returning its descriptor.
    pub fn remove_prepared(&self, release_id: &ReleaseId) -> Option<ReleaseDescriptor> {
        self.prepared.remove(release_id).map(|(_, descriptor)| descriptor)
    }

    /// Returns a copy of the prepared descriptor for `release_id`.
    #[must_use]
    pub fn prepared_release(&self, release_id: &ReleaseId) -> Option<ReleaseDescriptor> {
        self.prepared
            .get(release_id)
            .map(|entry| entry.value().clone())
    }

    /// Returns a snapshot of every prepared release.
    #[must_use]
    pub fn prepared_releases(&self) -> BTreeMap<ReleaseId, ReleaseDescriptor> {
        self.prepared
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Stores the result of the most recent task for `release_id`.
    pub fn store_result(&self, release_id: ReleaseId, result: ReleaseResult) {
        self.results.insert(release_id, result);
    }

    /// Returns a copy of the latest result for `release_id`.
    #[must_use]
    pub fn release_result(&self, release_id: &ReleaseId) -> Option<ReleaseResult> {
        self.results.get(release_id).map(|entry| entry.value().clone())
    }

    /// Returns a snapshot of every stored result.
    #[must_use]
    pub fn release_results(&self) -> BTreeMap<ReleaseId, ReleaseResult> {
        self.results
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Registers the listener for the operation about to run on `release_id`.
    pub fn register_listener(&self, release_id: ReleaseId, listener: Arc<dyn ReleaseListener>) {
        self.listeners.insert(release_id, listener);
    }

    /// Returns the listener registered for `release_id`.
    #[must_use]
    pub fn listener(&self, release_id: &ReleaseId) -> Option<Arc<dyn ReleaseListener>> {
        self.listeners
            .get(release_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Returns a snapshot of the listener registrations.
    #[must_use]
    pub fn listeners(&self) -> BTreeMap<ReleaseId, Arc<dyn ReleaseListener>> {
        self.listeners
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Removes the registration for `release_id` if it is still `listener`.
    ///
    /// A later request for the same release may already have registered its
    /// own listener; that registration is left untouched.
    pub fn release_listener(&self, release_id: &ReleaseId, listener: &Arc<dyn ReleaseListener>) {
        self.listeners
            .remove_if(release_id, |_, registered| same_listener(registered, listener));
    }
}

fn same_listener(left: &Arc<dyn ReleaseListener>, right: &Arc<dyn ReleaseListener>) -> bool {
    Arc::as_ptr(left).cast::<()>() == Arc::as_ptr(right).cast::<()>()
}
