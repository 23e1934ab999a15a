//! `git` command-line client.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use tokio::process::Command;
use tracing::debug;

use crate::release::ports::{CheckoutRequest, ScmClient, ScmCredentials, ScmError, ScmResult};

/// SCM client shelling out to the system `git`.
#[derive(Debug, Clone)]
pub struct GitScmClient {
    program: String,
    push_changes: bool,
}

impl Default for GitScmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitScmClient {
    /// Creates a client that commits and tags locally without pushing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "git".to_owned(),
            push_changes: false,
        }
    }

    /// Pushes commits and tags to `origin` after creating them.
    #[must_use]
    pub const fn with_push_changes(mut self, push_changes: bool) -> Self {
        self.push_changes = push_changes;
        self
    }

    /// Uses a different `git` executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    async fn run(
        &self,
        operation: &'static str,
        directory: Option<&Utf8Path>,
        args: &[&str],
    ) -> ScmResult<String> {
        let mut command = Command::new(&self.program);
        if let Some(dir) = directory {
            command.arg("-C").arg(dir.as_str());
        }
        command.args(args);
        debug!(operation, ?args, "running git");

        let output = command.output().await.map_err(ScmError::runtime)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        Err(ScmError::Rejected {
            operation,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

/// Embeds credential overrides into an HTTP(S) URL.
fn authenticated_url(url: &str, credentials: &ScmCredentials) -> String {
    let Some(username) = credentials.username() else {
        return url.to_owned();
    };
    let user_info = credentials.password().map_or_else(
        || username.to_owned(),
        |password| format!("{username}:{password}"),
    );
    ["https://", "http://"]
        .iter()
        .find_map(|scheme| {
            url.strip_prefix(scheme)
                .map(|rest| format!("{scheme}{user_info}@{rest}"))
        })
        .unwrap_or_else(|| url.to_owned())
}

#[async_trait]
impl ScmClient for GitScmClient {
    async fn checkout(&self, request: &CheckoutRequest) -> ScmResult<()> {
        if let Some(parent) = request.target().parent().filter(|p| !p.as_str().is_empty()) {
            Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(ScmError::runtime)?;
        }
        let url = authenticated_url(request.url(), request.credentials());
        let mut args = vec!["clone", "--quiet"];
        if let Some(tag) = request.tag() {
            args.extend(["--branch", tag]);
        }
        args.extend([url.as_str(), request.target().as_str()]);
        self.run("checkout", None, &args).await.map(|_| ())
    }

    async fn commit(&self, directory: &Utf8Path, message: &str) -> ScmResult<()> {
        self.run("commit", Some(directory), &["commit", "--all", "--quiet", "-m", message])
            .await?;
        if self.push_changes {
            self.run("commit", Some(directory), &["push", "--quiet", "origin", "HEAD"])
                .await?;
        }
        Ok(())
    }

    async fn tag(&self, directory: &Utf8Path, label: &str, message: &str) -> ScmResult<()> {
        self.run("tag", Some(directory), &["tag", "--annotate", label, "-m", message])
            .await?;
        if self.push_changes {
            self.run("tag", Some(directory), &["push", "--quiet", "origin", label])
                .await?;
        }
        Ok(())
    }

    async fn remove_tag(&self, directory: &Utf8Path, label: &str) -> ScmResult<()> {
        let listed = self
            .run("remove-tag", Some(directory), &["tag", "--list", label])
            .await?;
        if listed.trim().is_empty() {
            return Ok(());
        }
        self.run("remove-tag", Some(directory), &["tag", "--delete", label])
            .await?;
        if self.push_changes {
            self.run(
                "remove-tag",
                Some(directory),
                &["push", "--quiet", "--delete", "origin", label],
            )
            .await?;
        }
        Ok(())
    }
}
