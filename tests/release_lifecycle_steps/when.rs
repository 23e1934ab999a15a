//! When steps for release lifecycle BDD scenarios.

use std::{collections::BTreeMap, sync::Arc};

use super::world::{ReleaseWorld, Running, module_key, run_async};
use eyre::WrapErr;
use marshal::release::{
    domain::{ProjectDescriptor, ReleaseId},
    ports::ReleaseListener,
    services::{PerformReleaseRequest, PrepareReleaseRequest},
};
use rstest_bdd_macros::when;

#[when(r#"the release of "{module}" is prepared with development version "{version}""#)]
fn prepare_with_development_version(
    world: &mut ReleaseWorld,
    module: String,
    version: String,
) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    world.mark_submission();
    let running = world.running()?;
    let project = ProjectDescriptor::new(key.group(), key.artifact(), Running::repository_url(&key));
    let request = PrepareReleaseRequest::new(project, running.working_directory(&key))
        .with_development_versions(BTreeMap::from([(key.clone(), version)]))
        .with_listener(Arc::new(world.listener.clone()));
    running.manager.prepare(request).wrap_err("queue prepare")?;
    Ok(())
}

fn request_perform(
    world: &mut ReleaseWorld,
    module: &str,
    goals: Option<String>,
) -> Result<(), eyre::Report> {
    let key = module_key(module)?;
    world.mark_submission();
    let running = world.running()?;
    let release_id = ReleaseId::from_coordinates(key.group(), key.artifact())?;
    let mut request = PerformReleaseRequest::new(release_id, running.build_directory(&key))
        .with_listener(Arc::new(world.listener.clone()));
    if let Some(selected) = goals {
        request = request.with_goals(selected);
    }
    let admission = running.manager.perform(request).wrap_err("admit perform")?;
    world.perform_admission = Some(admission);
    Ok(())
}

#[when(r#"a perform of "{module}" is requested"#)]
fn perform_requested(world: &mut ReleaseWorld, module: String) -> Result<(), eyre::Report> {
    request_perform(world, &module, None)
}

#[when(r#"the perform of "{module}" is retried with goals "{goals}""#)]
fn perform_retried(
    world: &mut ReleaseWorld,
    module: String,
    goals: String,
) -> Result<(), eyre::Report> {
    request_perform(world, &module, Some(goals))
}

#[when(r#"the release of "{module}" is rolled back from its working directory"#)]
fn rollback_from_working_directory(
    world: &mut ReleaseWorld,
    module: String,
) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    world.mark_submission();
    let running = world.running()?;
    let release_id = ReleaseId::from_coordinates(key.group(), key.artifact())?;
    let listener: Arc<dyn ReleaseListener> = Arc::new(world.listener.clone());
    run_async(running.manager.rollback(
        release_id,
        &running.working_directory(&key),
        Some(listener),
    ))
    .wrap_err("queue rollback")?;
    Ok(())
}
