//! Project metadata supplied by callers and module graph entries produced by
//! reading build manifests.

use super::ModuleKey;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Project metadata a release request is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    group_id: String,
    artifact_id: String,
    scm_url: String,
    local_repository: Option<Utf8PathBuf>,
}

impl ProjectDescriptor {
    /// Creates project metadata from coordinates and the source-control URL.
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        scm_url: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            scm_url: scm_url.into(),
            local_repository: None,
        }
    }

    /// Sets a local artifact repository override for the build tool.
    #[must_use]
    pub fn with_local_repository(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.local_repository = Some(path.into());
        self
    }

    /// Returns the group coordinate.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Returns the artifact coordinate.
    #[must_use]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Returns the source-control URL.
    #[must_use]
    pub fn scm_url(&self) -> &str {
        &self.scm_url
    }

    /// Returns the local repository override, if any.
    #[must_use]
    pub fn local_repository(&self) -> Option<&Utf8Path> {
        self.local_repository.as_deref()
    }
}

/// One module participating in a multi-module release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactorProject {
    key: ModuleKey,
    version: String,
    manifest_path: Utf8PathBuf,
}

impl ReactorProject {
    /// Creates a reactor project entry.
    #[must_use]
    pub fn new(key: ModuleKey, version: impl Into<String>, manifest_path: Utf8PathBuf) -> Self {
        Self {
            key,
            version: version.into(),
            manifest_path,
        }
    }

    /// Returns the module coordinate.
    #[must_use]
    pub const fn key(&self) -> &ModuleKey {
        &self.key
    }

    /// Returns the version declared by the manifest when it was read.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the manifest file this module was read from.
    #[must_use]
    pub fn manifest_path(&self) -> &Utf8Path {
        &self.manifest_path
    }

    /// Returns the directory containing the module manifest.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.manifest_path
            .parent()
            .unwrap_or_else(|| Utf8Path::new("."))
    }
}
