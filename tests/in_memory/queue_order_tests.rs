//! FIFO execution within a queue.

use std::io;

use crate::in_memory::helpers::{Orchestrator, runtime};
use chrono::Utc;
use eyre::WrapErr;
use marshal::release::{
    adapters::memory::InMemoryGoalExecutor,
    domain::{ProjectDescriptor, ReleaseOperation, ReleaseStatus},
};
use rstest::rstest;
use tokio::runtime::Runtime;

#[rstest]
fn prepares_run_in_submission_order(runtime: io::Result<Runtime>) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let projects = [
        orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?,
        orchestrator.add_project("g", "b", "2.0-SNAPSHOT")?,
        orchestrator.add_project("g", "c", "0.3-SNAPSHOT")?,
    ];

    let since = Utc::now();
    let mut release_ids = Vec::new();
    for project in projects {
        release_ids.push(
            orchestrator
                .manager
                .prepare(orchestrator.prepare_request(project))?,
        );
    }
    for release_id in &release_ids {
        let result =
            rt.block_on(orchestrator.wait_for(release_id, ReleaseOperation::Prepare, since))?;
        assert_eq!(result.status(), ReleaseStatus::Success, "{}", result.output());
    }

    assert_eq!(orchestrator.scm.tag_log(), ["a-1.0", "b-2.0", "c-0.3"]);
    orchestrator.shutdown()
}

#[rstest]
fn a_failed_task_does_not_stop_its_queue(runtime: io::Result<Runtime>) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let lost = ProjectDescriptor::new("g", "lost", "mem://g/lost");
    let found = orchestrator.add_project("g", "found", "1.0-SNAPSHOT")?;

    let since = Utc::now();
    let lost_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(lost))?;
    let found_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(found))?;
    let failed = rt.block_on(orchestrator.wait_for(&lost_id, ReleaseOperation::Prepare, since))?;
    let succeeded =
        rt.block_on(orchestrator.wait_for(&found_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(failed.status(), ReleaseStatus::Failure);
    assert_eq!(succeeded.status(), ReleaseStatus::Success, "{}", succeeded.output());
    assert_eq!(
        orchestrator.manager.prepared_releases().keys().cloned().collect::<Vec<_>>(),
        [found_id]
    );
    orchestrator.shutdown()
}

#[rstest]
fn a_cyclic_module_tree_fails_without_stopping_the_worker(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    orchestrator
        .scm
        .add_repository(
            "mem://g/loop",
            [(
                "project.toml",
                "[project]\ngroup = \"g\"\nartifact = \"loop\"\nversion = \"1.0-SNAPSHOT\"\nmodules = [\".\"]\n",
            )],
        )
        .wrap_err("register cyclic repository")?;
    let looping = ProjectDescriptor::new("g", "loop", "mem://g/loop");
    let found = orchestrator.add_project("g", "found", "1.0-SNAPSHOT")?;

    let since = Utc::now();
    let loop_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(looping))?;
    let found_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(found))?;
    let failed = rt.block_on(orchestrator.wait_for(&loop_id, ReleaseOperation::Prepare, since))?;
    let succeeded =
        rt.block_on(orchestrator.wait_for(&found_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(failed.status(), ReleaseStatus::Failure);
    assert!(failed.error().is_some_and(|reason| reason.contains("module cycle")));
    assert_eq!(succeeded.status(), ReleaseStatus::Success, "{}", succeeded.output());
    orchestrator.shutdown()
}
