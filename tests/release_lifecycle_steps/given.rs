//! Given steps for release lifecycle BDD scenarios.

use super::world::{ReleaseWorld, Running, module_key};
use eyre::WrapErr;
use marshal::release::{
    domain::{ProjectDescriptor, ReleaseOperation, ReleaseStatus},
    services::PrepareReleaseRequest,
};
use rstest_bdd_macros::given;

#[given(r#"a repository for "{module}" at version "{version}""#)]
fn repository_at_version(
    world: &mut ReleaseWorld,
    module: String,
    version: String,
) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    world.start()?;
    let manifest = format!(
        "[project]\ngroup = \"{}\"\nartifact = \"{}\"\nversion = \"{version}\"\n",
        key.group(),
        key.artifact()
    );
    world
        .running()?
        .scm
        .add_repository(Running::repository_url(&key), [("project.toml", manifest)])
        .wrap_err("register repository")?;
    Ok(())
}

#[given(r#"the build goal "{goal}" fails"#)]
fn build_goal_fails(world: &mut ReleaseWorld, goal: String) {
    world.goals = std::mem::take(&mut world.goals).fail_on(goal);
}

#[given(r#"the release of "{module}" has been prepared"#)]
fn release_prepared(world: &mut ReleaseWorld, module: String) -> Result<(), eyre::Report> {
    let key = module_key(&module)?;
    world.mark_submission();
    let release_id = {
        let running = world.running()?;
        let project = ProjectDescriptor::new(
            key.group(),
            key.artifact(),
            Running::repository_url(&key),
        );
        running
            .manager
            .prepare(PrepareReleaseRequest::new(project, running.working_directory(&key)))
            .wrap_err("queue prepare")?
    };
    let result = world.await_result(&release_id, ReleaseOperation::Prepare)?;
    if result.status() != ReleaseStatus::Success {
        return Err(eyre::eyre!("prepare failed: {}", result.output()));
    }
    Ok(())
}
