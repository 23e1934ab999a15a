//! In-memory descriptor store keyed by working directory.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::release::{
    domain::ReleaseDescriptor,
    ports::{DescriptorStore, DescriptorStoreError, DescriptorStoreResult},
};

/// Thread-safe in-memory descriptor store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDescriptorStore {
    state: Arc<RwLock<HashMap<Utf8PathBuf, ReleaseDescriptor>>>,
}

impl InMemoryDescriptorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a descriptor is stored for the working directory.
    #[must_use]
    pub fn contains(&self, working_directory: &Utf8Path) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.contains_key(working_directory))
    }
}

fn poisoned(err: impl std::fmt::Display) -> DescriptorStoreError {
    DescriptorStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DescriptorStore for InMemoryDescriptorStore {
    async fn read(&self, partial: &ReleaseDescriptor) -> DescriptorStoreResult<ReleaseDescriptor> {
        let state = self.state.read().map_err(poisoned)?;
        let stored = state
            .get(&partial.working_directory)
            .cloned()
            .ok_or_else(|| DescriptorStoreError::NotFound(partial.working_directory.clone()))?;
        Ok(stored.merged_with(partial))
    }

    async fn write(&self, descriptor: &ReleaseDescriptor) -> DescriptorStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.insert(descriptor.working_directory.clone(), descriptor.clone());
        Ok(())
    }

    async fn delete(&self, working_directory: &Utf8Path) -> DescriptorStoreResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.remove(working_directory);
        Ok(())
    }
}
