//! In-memory source control with on-disk working copies.
//!
//! Repositories live in memory as path-to-content maps. Checkouts write the
//! files into the target directory; commits read the tracked paths back from
//! disk so phases that rewrite manifests are observable through the recorded
//! history.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::{Arc, RwLock};

use crate::release::ports::{CheckoutRequest, ScmClient, ScmError, ScmResult};

type Snapshot = BTreeMap<String, String>;

/// One recorded commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    /// Commit message.
    pub message: String,
    /// Tracked files at the commit.
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Repository {
    initial: Snapshot,
    commits: Vec<RecordedCommit>,
    tags: BTreeMap<String, Snapshot>,
}

impl Repository {
    fn head(&self) -> &Snapshot {
        self.commits
            .last()
            .map_or(&self.initial, |commit| &commit.files)
    }
}

#[derive(Debug, Default)]
struct ScmState {
    repositories: HashMap<String, Repository>,
    working_copies: HashMap<Utf8PathBuf, String>,
    tag_log: Vec<String>,
}

/// Thread-safe in-memory SCM client.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScmClient {
    state: Arc<RwLock<ScmState>>,
}

fn poisoned(err: impl std::fmt::Display) -> ScmError {
    ScmError::runtime(io::Error::other(err.to_string()))
}

impl InMemoryScmClient {
    /// Creates a client with no repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository with its initial files, keyed by relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::Runtime`] when the internal lock is poisoned.
    pub fn add_repository<P, C>(
        &self,
        url: impl Into<String>,
        files: impl IntoIterator<Item = (P, C)>,
    ) -> ScmResult<()>
    where
        P: Into<String>,
        C: Into<String>,
    {
        let mut state = self.state.write().map_err(poisoned)?;
        let initial = files
            .into_iter()
            .map(|(path, content)| (path.into(), content.into()))
            .collect();
        state.repositories.insert(
            url.into(),
            Repository {
                initial,
                ..Repository::default()
            },
        );
        Ok(())
    }

    /// Returns the tags of a repository, sorted by label.
    #[must_use]
    pub fn tags(&self, url: &str) -> Vec<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .repositories
                    .get(url)
                    .map(|repository| repository.tags.keys().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Returns every tag created across repositories, in creation order.
    #[must_use]
    pub fn tag_log(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.tag_log.clone())
            .unwrap_or_default()
    }

    /// Returns the commits recorded for a repository, oldest first.
    #[must_use]
    pub fn commits(&self, url: &str) -> Vec<RecordedCommit> {
        self.state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .repositories
                    .get(url)
                    .map(|repository| repository.commits.clone())
            })
            .unwrap_or_default()
    }

    /// Returns a file as recorded by a tag.
    #[must_use]
    pub fn tagged_file(&self, url: &str, tag: &str, path: &str) -> Option<String> {
        let state = self.state.read().ok()?;
        state
            .repositories
            .get(url)?
            .tags
            .get(tag)?
            .get(path)
            .cloned()
    }

    /// Returns a file at the head of the repository.
    #[must_use]
    pub fn head_file(&self, url: &str, path: &str) -> Option<String> {
        let state = self.state.read().ok()?;
        state.repositories.get(url)?.head().get(path).cloned()
    }

    fn working_copy_url(state: &ScmState, directory: &Utf8Path) -> ScmResult<String> {
        state
            .working_copies
            .get(directory)
            .cloned()
            .ok_or_else(|| ScmError::NotAWorkingCopy(directory.to_path_buf()))
    }
}

fn materialise(target: &Utf8Path, files: &Snapshot) -> io::Result<()> {
    Dir::create_ambient_dir_all(target, ambient_authority())?;
    let dir = Dir::open_ambient_dir(target, ambient_authority())?;
    for (path, content) in files {
        if let Some(parent) = Utf8Path::new(path).parent().filter(|p| !p.as_str().is_empty()) {
            dir.create_dir_all(parent)?;
        }
        dir.write(path, content)?;
    }
    Ok(())
}

fn read_tracked(directory: &Utf8Path, tracked: &Snapshot) -> io::Result<Snapshot> {
    let dir = Dir::open_ambient_dir(directory, ambient_authority())?;
    let mut files = Snapshot::new();
    for path in tracked.keys() {
        match dir.read_to_string(path) {
            Ok(content) => {
                files.insert(path.clone(), content);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(files)
}

#[async_trait]
impl ScmClient for InMemoryScmClient {
    async fn checkout(&self, request: &CheckoutRequest) -> ScmResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let repository = state
            .repositories
            .get(request.url())
            .ok_or_else(|| ScmError::UnknownRepository(request.url().to_owned()))?;
        let files = match request.tag() {
            Some(tag) => repository.tags.get(tag).ok_or_else(|| ScmError::Rejected {
                operation: "checkout",
                reason: format!("unknown tag {tag}"),
            })?,
            None => repository.head(),
        };
        materialise(request.target(), files).map_err(ScmError::runtime)?;
        state
            .working_copies
            .insert(request.target().to_path_buf(), request.url().to_owned());
        Ok(())
    }

    async fn commit(&self, directory: &Utf8Path, message: &str) -> ScmResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let url = Self::working_copy_url(&state, directory)?;
        let repository = state
            .repositories
            .get_mut(&url)
            .ok_or(ScmError::UnknownRepository(url))?;
        let files = read_tracked(directory, repository.head()).map_err(ScmError::runtime)?;
        repository.commits.push(RecordedCommit {
            message: message.to_owned(),
            files,
        });
        Ok(())
    }

    async fn tag(&self, directory: &Utf8Path, label: &str, _message: &str) -> ScmResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let url = Self::working_copy_url(&state, directory)?;
        let repository = state
            .repositories
            .get_mut(&url)
            .ok_or(ScmError::UnknownRepository(url))?;
        if repository.tags.contains_key(label) {
            return Err(ScmError::Rejected {
                operation: "tag",
                reason: format!("tag {label} already exists"),
            });
        }
        let snapshot = repository.head().clone();
        repository.tags.insert(label.to_owned(), snapshot);
        state.tag_log.push(label.to_owned());
        Ok(())
    }

    async fn remove_tag(&self, directory: &Utf8Path, label: &str) -> ScmResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let url = Self::working_copy_url(&state, directory)?;
        if let Some(repository) = state.repositories.get_mut(&url) {
            repository.tags.remove(label);
        }
        Ok(())
    }
}
