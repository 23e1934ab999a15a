//! Error types for release domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing release domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReleaseDomainError {
    /// The release identifier is empty after trimming.
    #[error("release identifier must not be empty")]
    EmptyReleaseId,

    /// A project coordinate component is empty.
    #[error("project {component} must not be empty")]
    EmptyCoordinate {
        /// Coordinate component name (`group` or `artifact`).
        component: &'static str,
    },

    /// The module key does not follow `group:artifact` format.
    #[error("invalid module key '{0}', expected group:artifact")]
    InvalidModuleKey(String),
}

/// Error returned while parsing release operations or statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown release {kind}: {value}")]
pub struct ParseReleaseValueError {
    /// The value family being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}
