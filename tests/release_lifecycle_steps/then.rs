//! Then steps for release lifecycle BDD scenarios.

use super::world::{ReleaseWorld, module_key};
use eyre::eyre;
use marshal::release::{
    adapters::fs::{DESCRIPTOR_FILE_NAME, TomlProjectManifests},
    domain::{ReleaseId, ReleaseOperation, ReleaseStatus},
    ports::ProjectManifests,
    services::PerformAdmission,
};
use rstest_bdd_macros::then;

fn release_id(module: &str) -> Result<ReleaseId, eyre::Report> {
    let key = module_key(module)?;
    Ok(ReleaseId::from_coordinates(key.group(), key.artifact())?)
}

#[then(r#"the "{operation}" result for "{module}" is "{status}""#)]
fn result_has_status(
    world: &ReleaseWorld,
    operation: String,
    module: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected_operation = ReleaseOperation::try_from(operation.as_str())
        .map_err(|err| eyre!("invalid operation in scenario: {err}"))?;
    let expected_status = ReleaseStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid status in scenario: {err}"))?;

    let result = world.await_result(&release_id(&module)?, expected_operation)?;

    if result.status() != expected_status {
        return Err(eyre!(
            "expected {expected_operation} to end with {expected_status}, got {}: {}",
            result.status(),
            result.error().unwrap_or_default()
        ));
    }
    Ok(())
}

#[then(r#""{module}" is listed among the prepared releases"#)]
fn listed_as_prepared(world: &ReleaseWorld, module: String) -> Result<(), eyre::Report> {
    let release_id = release_id(&module)?;
    if !world
        .running()?
        .manager
        .prepared_releases()
        .contains_key(&release_id)
    {
        return Err(eyre!("{release_id} is not prepared"));
    }
    Ok(())
}

#[then(r#"the working copy of "{module}" is at version "{version}""#)]
fn working_copy_version(
    world: &ReleaseWorld,
    module: String,
    version: String,
) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    let manifest = world
        .running()?
        .working_directory(&key)
        .join("project.toml");
    let projects = TomlProjectManifests::new().read_projects(&manifest)?;
    let root = projects
        .first()
        .ok_or_else(|| eyre!("no project declared in {manifest}"))?;
    if root.version() != version {
        return Err(eyre!("expected version {version}, found {}", root.version()));
    }
    Ok(())
}

#[then("no perform task is queued")]
fn no_perform_queued(world: &ReleaseWorld) -> Result<(), eyre::Report> {
    match world.perform_admission {
        Some(PerformAdmission::NotPrepared) => Ok(()),
        other => Err(eyre!("expected the perform to be skipped, got {other:?}")),
    }
}

#[then(r#"no result is recorded for "{module}""#)]
fn no_result_recorded(world: &ReleaseWorld, module: String) -> Result<(), eyre::Report> {
    let release_id = release_id(&module)?;
    if let Some(result) = world.running()?.manager.release_result(&release_id) {
        return Err(eyre!("unexpected {} result", result.operation()));
    }
    Ok(())
}

#[then(r#"no release artefacts remain in the working copy of "{module}""#)]
fn no_release_artefacts(world: &ReleaseWorld, module: String) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    let directory = world.running()?.working_directory(&key);
    for artefact in [DESCRIPTOR_FILE_NAME, "project.toml.releaseBackup"] {
        if directory.join(artefact).exists() {
            return Err(eyre!("{artefact} remains in {directory}"));
        }
    }
    Ok(())
}

#[then("the listener received exactly one error")]
fn listener_received_one_error(world: &ReleaseWorld) -> Result<(), eyre::Report> {
    let errors = world.listener.errors();
    if errors.len() != 1 {
        return Err(eyre!("expected one listener error, got {errors:?}"));
    }
    Ok(())
}
