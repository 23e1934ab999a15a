//! Shared fixtures: an in-memory repository checked out into a temp dir.

use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use crate::release::{
    adapters::{
        fs::TomlProjectManifests,
        memory::{InMemoryDescriptorStore, InMemoryGoalExecutor, InMemoryScmClient},
    },
    domain::{ReleaseDescriptor, ReleaseEnvironment, ToolSettings},
    pipeline::{PipelineCollaborators, PipelineReleaseEngine},
};

pub(super) const REPOSITORY_URL: &str = "mem://g/a";

pub(super) const ROOT_MANIFEST: &str = r#"[project]
group = "g"
artifact = "a"
version = "1.0-SNAPSHOT"
"#;

pub(super) struct Harness {
    _temp: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) scm: Arc<InMemoryScmClient>,
    pub(super) goals: Arc<InMemoryGoalExecutor>,
    pub(super) store: Arc<InMemoryDescriptorStore>,
    pub(super) manifests: Arc<TomlProjectManifests>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::with_goals(InMemoryGoalExecutor::new())
    }

    pub(super) fn with_goals(goals: InMemoryGoalExecutor) -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp path");
        let scm = InMemoryScmClient::new();
        scm.add_repository(REPOSITORY_URL, [("project.toml", ROOT_MANIFEST)])
            .expect("repository registers");
        Self {
            _temp: temp,
            root,
            scm: Arc::new(scm),
            goals: Arc::new(goals),
            store: Arc::new(InMemoryDescriptorStore::new()),
            manifests: Arc::new(TomlProjectManifests::new()),
        }
    }

    pub(super) fn working_directory(&self) -> Utf8PathBuf {
        self.root.join("work")
    }

    pub(super) fn build_directory(&self) -> Utf8PathBuf {
        self.root.join("checkout")
    }

    pub(super) fn descriptor(&self) -> ReleaseDescriptor {
        ReleaseDescriptor::new(self.working_directory()).with_scm_source_url(REPOSITORY_URL)
    }

    pub(super) fn collaborators(&self) -> PipelineCollaborators {
        PipelineCollaborators::new(
            self.scm.clone(),
            self.goals.clone(),
            self.manifests.clone(),
            self.store.clone(),
        )
    }

    pub(super) fn engine(&self) -> PipelineReleaseEngine {
        PipelineReleaseEngine::new(&self.collaborators())
    }

    pub(super) fn working_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.working_directory().join(name)).expect("working file")
    }
}

pub(super) fn environment() -> ReleaseEnvironment {
    ReleaseEnvironment::new("forked-path", ToolSettings::default())
}
