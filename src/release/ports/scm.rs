//! Source-control port used by checkout, commit and tag phases.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for source-control operations.
pub type ScmResult<T> = Result<T, ScmError>;

/// Optional credential overrides for source-control access.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ScmCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl ScmCredentials {
    /// Creates credentials from optional overrides.
    #[must_use]
    pub const fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Returns the user name override.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the password override.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for ScmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Parameters of a checkout into a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    url: String,
    target: Utf8PathBuf,
    tag: Option<String>,
    credentials: ScmCredentials,
}

impl CheckoutRequest {
    /// Creates a checkout of the default branch of `url` into `target`.
    #[must_use]
    pub fn new(url: impl Into<String>, target: impl Into<Utf8PathBuf>) -> Self {
        Self {
            url: url.into(),
            target: target.into(),
            tag: None,
            credentials: ScmCredentials::default(),
        }
    }

    /// Checks out the given tag instead of the default branch.
    #[must_use]
    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    /// Sets credential overrides.
    #[must_use]
    pub fn with_credentials(mut self, credentials: ScmCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Returns the repository URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the checkout directory.
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Returns the tag to check out, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns the credential overrides.
    #[must_use]
    pub const fn credentials(&self) -> &ScmCredentials {
        &self.credentials
    }
}

/// Source-control operations needed by the release phases.
#[async_trait]
pub trait ScmClient: Send + Sync {
    /// Checks out a repository into an absent or empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError`] when the repository or tag cannot be checked out.
    async fn checkout(&self, request: &CheckoutRequest) -> ScmResult<()>;

    /// Commits every change in the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError`] when the commit is rejected.
    async fn commit(&self, directory: &Utf8Path, message: &str) -> ScmResult<()>;

    /// Tags the current revision of the working copy.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError`] when the tag cannot be created.
    async fn tag(&self, directory: &Utf8Path, label: &str, message: &str) -> ScmResult<()>;

    /// Removes a tag. Removing a missing tag is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError`] when the tag exists but cannot be removed.
    async fn remove_tag(&self, directory: &Utf8Path, label: &str) -> ScmResult<()>;
}

/// Errors returned by source-control clients.
#[derive(Debug, Clone, Error)]
pub enum ScmError {
    /// The repository URL is not known to the client.
    #[error("unknown repository: {0}")]
    UnknownRepository(String),

    /// The directory is not a working copy managed by the client.
    #[error("not a working copy: {0}")]
    NotAWorkingCopy(Utf8PathBuf),

    /// The SCM rejected an operation.
    #[error("scm {operation} failed: {reason}")]
    Rejected {
        /// Operation name (`checkout`, `commit`, `tag`, `remove-tag`).
        operation: &'static str,
        /// Failure reason reported by the SCM.
        reason: String,
    },

    /// Client infrastructure failure.
    #[error("scm runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ScmError {
    /// Wraps a client infrastructure error.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
