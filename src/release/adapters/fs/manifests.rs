//! TOML project manifests edited in place with `toml_edit`.
//!
//! A manifest declares one module:
//!
//! ```toml
//! [project]
//! group = "org.example"
//! artifact = "app"
//! version = "1.0-SNAPSHOT"
//! modules = ["core", "cli"]
//! ```
//!
//! Each entry in `modules` names a subdirectory holding a manifest with the
//! same file name. Modules inherit `group` when they omit it.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::{collections::BTreeSet, io};
use toml_edit::{DocumentMut, Item};

use crate::release::{
    domain::{ModuleKey, ReactorProject},
    ports::{BACKUP_SUFFIX, ManifestError, ManifestResult, ProjectManifests},
};

const PROJECT_TABLE: &str = "project";

/// Deepest directory level searched for a matching manifest.
const MAX_SEARCH_DEPTH: usize = 32;

/// Manifest adapter for `project.toml`-style files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlProjectManifests;

impl TomlProjectManifests {
    /// Creates the adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

struct ManifestLocation<'a> {
    dir: Dir,
    file_name: &'a str,
}

fn locate(manifest: &Utf8Path) -> ManifestResult<ManifestLocation<'_>> {
    let file_name = manifest.file_name().ok_or_else(|| ManifestError::Invalid {
        path: manifest.to_path_buf(),
        reason: "manifest path has no file name".to_owned(),
    })?;
    let parent = manifest
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| not_found_or_io(manifest, err))?;
    Ok(ManifestLocation { dir, file_name })
}

fn not_found_or_io(manifest: &Utf8Path, err: io::Error) -> ManifestError {
    if err.kind() == io::ErrorKind::NotFound {
        ManifestError::NotFound(manifest.to_path_buf())
    } else {
        ManifestError::io(err)
    }
}

fn read_document(manifest: &Utf8Path) -> ManifestResult<(ManifestLocation<'_>, DocumentMut)> {
    let location = locate(manifest)?;
    let contents = location
        .dir
        .read_to_string(location.file_name)
        .map_err(|err| not_found_or_io(manifest, err))?;
    let document = contents
        .parse::<DocumentMut>()
        .map_err(|err| ManifestError::Invalid {
            path: manifest.to_path_buf(),
            reason: err.to_string(),
        })?;
    Ok((location, document))
}

fn project_str<'d>(document: &'d DocumentMut, key: &str) -> Option<&'d str> {
    document
        .get(PROJECT_TABLE)
        .and_then(|project| project.get(key))
        .and_then(Item::as_str)
}

fn module_entries(document: &DocumentMut) -> Vec<String> {
    document
        .get(PROJECT_TABLE)
        .and_then(|project| project.get("modules"))
        .and_then(Item::as_array)
        .map(|modules| {
            modules
                .iter()
                .filter_map(|module| module.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn missing_key(manifest: &Utf8Path, key: &str) -> ManifestError {
    ManifestError::Invalid {
        path: manifest.to_path_buf(),
        reason: format!("missing [{PROJECT_TABLE}] {key}"),
    }
}

fn describe(
    manifest: &Utf8Path,
    document: &DocumentMut,
    inherited_group: Option<&str>,
) -> ManifestResult<ReactorProject> {
    let group = project_str(document, "group")
        .or(inherited_group)
        .ok_or_else(|| missing_key(manifest, "group"))?;
    let artifact =
        project_str(document, "artifact").ok_or_else(|| missing_key(manifest, "artifact"))?;
    let version =
        project_str(document, "version").ok_or_else(|| missing_key(manifest, "version"))?;
    let key = ModuleKey::new(group, artifact).map_err(|err| ManifestError::Invalid {
        path: manifest.to_path_buf(),
        reason: err.to_string(),
    })?;
    Ok(ReactorProject::new(key, version, manifest.to_path_buf()))
}

fn collect_projects(
    manifest: &Utf8Path,
    inherited_group: Option<&str>,
    visited: &mut BTreeSet<Utf8PathBuf>,
    projects: &mut Vec<ReactorProject>,
) -> ManifestResult<()> {
    let (location, document) = read_document(manifest)?;
    let canonical = manifest.canonicalize_utf8().map_err(ManifestError::io)?;
    if !visited.insert(canonical) {
        return Err(ManifestError::Invalid {
            path: manifest.to_path_buf(),
            reason: "module cycle: manifest is already part of the reactor".to_owned(),
        });
    }
    let project = describe(manifest, &document, inherited_group)?;
    let group = project.key().group().to_owned();
    let base = project.directory().to_path_buf();
    projects.push(project);

    for module in module_entries(&document) {
        let module_manifest = base.join(&module).join(location.file_name);
        collect_projects(&module_manifest, Some(&group), visited, projects)?;
    }
    Ok(())
}

fn search(
    directory: &Utf8Path,
    key: &ModuleKey,
    file_name: &str,
    inherited_group: Option<&str>,
    depth: usize,
) -> ManifestResult<Option<Utf8PathBuf>> {
    if depth > MAX_SEARCH_DEPTH {
        return Err(ManifestError::Invalid {
            path: directory.to_path_buf(),
            reason: format!("manifest search deeper than {MAX_SEARCH_DEPTH} directories"),
        });
    }
    let dir = Dir::open_ambient_dir(directory, ambient_authority()).map_err(ManifestError::io)?;
    let mut group = inherited_group.map(str::to_owned);
    if dir.is_file(file_name) {
        let candidate = directory.join(file_name);
        let (_, document) = read_document(&candidate)?;
        if let Some(declared_group) = project_str(&document, "group") {
            group = Some(declared_group.to_owned());
        }
        let declared = group
            .as_deref()
            .zip(project_str(&document, "artifact"))
            .and_then(|(module_group, artifact)| ModuleKey::new(module_group, artifact).ok());
        if declared.as_ref() == Some(key) {
            return Ok(Some(candidate));
        }
    }

    let mut subdirectories = Vec::new();
    for item in dir.entries().map_err(ManifestError::io)? {
        let entry = item.map_err(ManifestError::io)?;
        let name = entry.file_name().map_err(ManifestError::io)?;
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map_err(ManifestError::io)?.is_dir() {
            subdirectories.push(name);
        }
    }
    subdirectories.sort();

    for name in subdirectories {
        let subdirectory = directory.join(name);
        if let Some(found) = search(&subdirectory, key, file_name, group.as_deref(), depth + 1)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn backup_name(file_name: &str) -> String {
    format!("{file_name}{BACKUP_SUFFIX}")
}

impl ProjectManifests for TomlProjectManifests {
    fn read_projects(&self, manifest: &Utf8Path) -> ManifestResult<Vec<ReactorProject>> {
        let mut projects = Vec::new();
        collect_projects(manifest, None, &mut BTreeSet::new(), &mut projects)?;
        Ok(projects)
    }

    fn set_version(&self, manifest: &Utf8Path, version: &str) -> ManifestResult<()> {
        let (location, mut document) = read_document(manifest)?;
        let project = document
            .get_mut(PROJECT_TABLE)
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| missing_key(manifest, "table"))?;
        project.insert("version", toml_edit::value(version));
        location
            .dir
            .write(location.file_name, document.to_string())
            .map_err(ManifestError::io)
    }

    fn find_matching(
        &self,
        root: &Utf8Path,
        key: &ModuleKey,
        file_name: &str,
    ) -> ManifestResult<Option<Utf8PathBuf>> {
        search(root, key, file_name, None, 0)
    }

    fn backup(&self, manifest: &Utf8Path) -> ManifestResult<()> {
        let location = locate(manifest)?;
        let backup = backup_name(location.file_name);
        if location.dir.exists(&backup) {
            return Ok(());
        }
        let contents = location
            .dir
            .read_to_string(location.file_name)
            .map_err(|err| not_found_or_io(manifest, err))?;
        location
            .dir
            .write(&backup, contents)
            .map_err(ManifestError::io)
    }

    fn restore_backup(&self, manifest: &Utf8Path) -> ManifestResult<bool> {
        let location = locate(manifest)?;
        let backup = backup_name(location.file_name);
        if !location.dir.exists(&backup) {
            return Ok(false);
        }
        let contents = location
            .dir
            .read_to_string(&backup)
            .map_err(ManifestError::io)?;
        location
            .dir
            .write(location.file_name, contents)
            .map_err(ManifestError::io)?;
        location
            .dir
            .remove_file(&backup)
            .map_err(ManifestError::io)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::TomlProjectManifests;
    use crate::release::domain::ModuleKey;
    use crate::release::ports::ProjectManifests;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};

    const ROOT: &str = "# release fixture\n[project]\ngroup = \"g\"\nartifact = \"a\"\nversion = \"1.0-SNAPSHOT\" # current\nmodules = [\"core\"]\n";
    const CORE: &str = "[project]\nartifact = \"a-core\"\nversion = \"1.0-SNAPSHOT\"\n";

    struct Workspace {
        _temp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn workspace() -> Workspace {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp path");
        std::fs::create_dir_all(root.join("core")).expect("create module dir");
        std::fs::write(root.join("project.toml"), ROOT).expect("write root manifest");
        std::fs::write(root.join("core/project.toml"), CORE).expect("write module manifest");
        Workspace { _temp: temp, root }
    }

    #[rstest]
    fn read_projects_lists_root_then_modules_with_inherited_group(workspace: Workspace) {
        let projects = TomlProjectManifests::new()
            .read_projects(&workspace.root.join("project.toml"))
            .expect("read projects");

        let keys: Vec<String> = projects.iter().map(|p| p.key().to_string()).collect();
        assert_eq!(keys, vec!["g:a".to_owned(), "g:a-core".to_owned()]);
        assert_eq!(projects.first().map(|p| p.version()), Some("1.0-SNAPSHOT"));
    }

    #[rstest]
    fn set_version_preserves_comments(workspace: Workspace) {
        let manifest = workspace.root.join("project.toml");

        TomlProjectManifests::new()
            .set_version(&manifest, "1.0")
            .expect("set version");

        let contents = std::fs::read_to_string(&manifest).expect("read manifest");
        assert!(contents.contains("# release fixture"));
        assert!(contents.contains("version = \"1.0\""));
    }

    #[rstest]
    fn backup_is_written_once_and_restored(workspace: Workspace) {
        let manifests = TomlProjectManifests::new();
        let manifest = workspace.root.join("project.toml");

        manifests.backup(&manifest).expect("first backup");
        manifests.set_version(&manifest, "1.0").expect("rewrite");
        manifests.backup(&manifest).expect("second backup keeps pristine copy");
        let restored = manifests.restore_backup(&manifest).expect("restore");

        assert!(restored);
        assert_eq!(std::fs::read_to_string(&manifest).expect("read"), ROOT);
        assert!(!workspace.root.join("project.toml.releaseBackup").exists());
        assert!(!manifests.restore_backup(&manifest).expect("second restore"));
    }

    #[rstest]
    fn find_matching_descends_into_nested_directories(workspace: Workspace) {
        let key = ModuleKey::new("g", "a-core").expect("key");

        let found = TomlProjectManifests::new()
            .find_matching(&workspace.root, &key, "project.toml")
            .expect("search");

        assert_eq!(found, Some(workspace.root.join("core/project.toml")));
    }

    #[rstest]
    #[case("[project]\ngroup = \"g\"\nartifact = \"a\"\nversion = \"1.0\"\nmodules = [\".\"]\n")]
    #[case("[project]\ngroup = \"g\"\nartifact = \"a\"\nversion = \"1.0\"\nmodules = [\"core\", \"core/..\"]\n")]
    fn module_cycles_are_invalid_manifests(workspace: Workspace, #[case] root: &str) {
        std::fs::write(workspace.root.join("project.toml"), root).expect("write root manifest");

        let result = TomlProjectManifests::new().read_projects(&workspace.root.join("project.toml"));

        assert!(matches!(
            result,
            Err(crate::release::ports::ManifestError::Invalid { ref reason, .. })
                if reason.contains("module cycle")
        ));
    }

    #[rstest]
    fn modules_pointing_back_at_each_other_are_invalid(workspace: Workspace) {
        std::fs::write(
            workspace.root.join("core/project.toml"),
            "[project]\nartifact = \"a-core\"\nversion = \"1.0\"\nmodules = [\"..\"]\n",
        )
        .expect("write module manifest");

        let result = TomlProjectManifests::new().read_projects(&workspace.root.join("project.toml"));

        assert!(matches!(
            result,
            Err(crate::release::ports::ManifestError::Invalid { .. })
        ));
    }

    #[rstest]
    fn search_gives_up_below_the_depth_limit(workspace: Workspace) {
        let deep = (0..=super::MAX_SEARCH_DEPTH).fold(workspace.root.join("nest"), |path, level| {
            path.join(format!("d{level}"))
        });
        std::fs::create_dir_all(&deep).expect("create nested dirs");
        let key = ModuleKey::new("g", "absent").expect("key");

        let result = TomlProjectManifests::new().find_matching(&workspace.root, &key, "project.toml");

        assert!(matches!(
            result,
            Err(crate::release::ports::ManifestError::Invalid { .. })
        ));
    }

    #[rstest]
    fn missing_manifest_is_not_found(workspace: Workspace) {
        let result = TomlProjectManifests::new().read_projects(&workspace.root.join("absent.toml"));

        assert!(matches!(
            result,
            Err(crate::release::ports::ManifestError::NotFound(_))
        ));
    }
}
