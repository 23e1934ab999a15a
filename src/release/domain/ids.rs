//! Identifier types for the release domain.

use super::ReleaseDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable key identifying one release lifecycle across prepare, perform and
/// rollback requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Creates a validated release identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyReleaseId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ReleaseDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(ReleaseDomainError::EmptyReleaseId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Derives the release identifier from project coordinates.
    ///
    /// The identifier has the form `group:artifact`, so repeated requests for
    /// the same project always address the same release.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyCoordinate`] when either coordinate
    /// is empty.
    pub fn from_coordinates(group: &str, artifact: &str) -> Result<Self, ReleaseDomainError> {
        let key = ModuleKey::new(group, artifact)?;
        Ok(Self(key.to_string()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ReleaseId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Module coordinate used as the key of per-module version maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleKey {
    group: String,
    artifact: String,
}

impl ModuleKey {
    /// Creates a module key from its coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::EmptyCoordinate`] when either coordinate
    /// is empty after trimming.
    pub fn new(group: &str, artifact: &str) -> Result<Self, ReleaseDomainError> {
        let group_trimmed = group.trim();
        let artifact_trimmed = artifact.trim();
        if group_trimmed.is_empty() {
            return Err(ReleaseDomainError::EmptyCoordinate { component: "group" });
        }
        if artifact_trimmed.is_empty() {
            return Err(ReleaseDomainError::EmptyCoordinate {
                component: "artifact",
            });
        }
        Ok(Self {
            group: group_trimmed.to_owned(),
            artifact: artifact_trimmed.to_owned(),
        })
    }

    /// Parses a `group:artifact` string.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseDomainError::InvalidModuleKey`] when the value does
    /// not contain exactly two non-empty colon-separated parts.
    pub fn parse(value: &str) -> Result<Self, ReleaseDomainError> {
        let mut parts = value.split(':');
        let group = parts.next().unwrap_or_default();
        let artifact = parts.next().unwrap_or_default();
        if parts.next().is_some() {
            return Err(ReleaseDomainError::InvalidModuleKey(value.to_owned()));
        }
        Self::new(group, artifact)
            .map_err(|_| ReleaseDomainError::InvalidModuleKey(value.to_owned()))
    }

    /// Returns the group coordinate.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the artifact coordinate.
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

impl TryFrom<String> for ModuleKey {
    type Error = ReleaseDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ModuleKey> for String {
    fn from(value: ModuleKey) -> Self {
        value.to_string()
    }
}

/// Identifier of one task execution, attached to its result and log span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRunId(Uuid);

impl TaskRunId {
    /// Creates a new random run identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
