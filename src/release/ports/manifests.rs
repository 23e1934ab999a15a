//! Build manifest port: module graph reading and version rewriting.

use crate::release::domain::{ModuleKey, ReactorProject};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Suffix of the pristine manifest copy written before a release rewrite.
pub const BACKUP_SUFFIX: &str = ".releaseBackup";

/// Reads and rewrites project build manifests.
pub trait ProjectManifests: Send + Sync {
    /// Reads the root manifest and every module it declares, root first.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] when a manifest is missing and
    /// [`ManifestError::Invalid`] when one cannot be parsed.
    fn read_projects(&self, manifest: &Utf8Path) -> ManifestResult<Vec<ReactorProject>>;

    /// Rewrites the version declared by one manifest, preserving formatting.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the manifest cannot be read, parsed or
    /// written.
    fn set_version(&self, manifest: &Utf8Path, version: &str) -> ManifestResult<()>;

    /// Searches `root` for a manifest named `file_name` declaring `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] when the directory tree cannot be walked.
    fn find_matching(
        &self,
        root: &Utf8Path,
        key: &ModuleKey,
        file_name: &str,
    ) -> ManifestResult<Option<Utf8PathBuf>>;

    /// Copies the manifest to its backup unless a backup already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the copy fails.
    fn backup(&self, manifest: &Utf8Path) -> ManifestResult<()>;

    /// Restores the manifest from its backup and deletes the backup.
    /// Returns `false` when no backup exists.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the restore fails.
    fn restore_backup(&self, manifest: &Utf8Path) -> ManifestResult<bool>;
}

/// Errors returned by manifest adapters.
#[derive(Debug, Clone, Error)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("manifest not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The manifest could not be parsed or lacks required keys.
    #[error("invalid manifest {path}: {reason}")]
    Invalid {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Parser or validation message.
        reason: String,
    },

    /// Filesystem failure.
    #[error("manifest io error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl ManifestError {
    /// Wraps a filesystem error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
