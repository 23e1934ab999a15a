//! Persistence port for release descriptors.

use crate::release::domain::ReleaseDescriptor;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for descriptor store operations.
pub type DescriptorStoreResult<T> = Result<T, DescriptorStoreError>;

/// Project-local persistence for release descriptors.
///
/// Descriptors are keyed by their working directory. The store for one
/// working directory is a single-writer resource; callers must not issue
/// concurrent writes against the same directory.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Reads the full descriptor for the working directory named by
    /// `partial`, overlaying the fields the partial descriptor sets.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorStoreError::NotFound`] when nothing was persisted
    /// and [`DescriptorStoreError::Corrupt`] when the persisted form cannot be
    /// decoded.
    async fn read(&self, partial: &ReleaseDescriptor) -> DescriptorStoreResult<ReleaseDescriptor>;

    /// Persists a descriptor under its working directory, replacing any
    /// previous copy.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorStoreError::Persistence`] when the write fails.
    async fn write(&self, descriptor: &ReleaseDescriptor) -> DescriptorStoreResult<()>;

    /// Removes the persisted descriptor. Removing a missing descriptor is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorStoreError::Persistence`] when removal fails.
    async fn delete(&self, working_directory: &Utf8Path) -> DescriptorStoreResult<()>;
}

/// Errors returned by descriptor store implementations.
#[derive(Debug, Clone, Error)]
pub enum DescriptorStoreError {
    /// No descriptor was persisted for the working directory.
    #[error("no release descriptor persisted in {0}")]
    NotFound(Utf8PathBuf),

    /// The persisted descriptor could not be decoded.
    #[error("corrupt release descriptor in {path}: {reason}")]
    Corrupt {
        /// Working directory holding the descriptor.
        path: Utf8PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DescriptorStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
