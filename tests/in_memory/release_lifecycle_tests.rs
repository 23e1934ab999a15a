//! Prepare, perform and rollback through the worker threads.

use std::{io, sync::Arc};

use crate::in_memory::helpers::{Orchestrator, manifest, runtime};
use chrono::Utc;
use eyre::{WrapErr, eyre};
use marshal::release::{
    adapters::{
        fs::DESCRIPTOR_FILE_NAME,
        memory::{InMemoryGoalExecutor, RecordingReleaseListener},
    },
    domain::{ReleaseOperation, ReleaseProperties, ReleaseStatus},
    services::{PerformAdmission, PerformReleaseRequest},
};
use rstest::rstest;
use tokio::runtime::Runtime;

#[rstest]
fn workers_are_named_after_their_queues() -> eyre::Result<()> {
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;

    assert_eq!(
        orchestrator.worker_names(),
        ["release-prepare", "release-perform", "release-rollback"]
    );
    orchestrator.shutdown()
}

#[rstest]
fn prepared_release_is_performed_from_its_tag(runtime: io::Result<Runtime>) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;

    let since = Utc::now();
    let release_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(project))?;
    let prepared = rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(prepared.status(), ReleaseStatus::Success, "{}", prepared.output());
    assert!(orchestrator.manager.prepared_release(&release_id).is_some());
    assert!(orchestrator.working_file("a", "project.toml")?.contains("1.1-SNAPSHOT"));
    assert!(
        orchestrator
            .working_directory("a")
            .join(DESCRIPTOR_FILE_NAME)
            .exists()
    );
    assert_eq!(orchestrator.scm.tags("mem://g/a"), ["a-1.0"]);

    let since = Utc::now();
    let admitted = orchestrator.manager.perform(PerformReleaseRequest::new(
        release_id.clone(),
        orchestrator.build_directory("a"),
    ))?;
    let performed =
        rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Perform, since))?;

    assert_eq!(admitted, PerformAdmission::Enqueued);
    assert_eq!(performed.status(), ReleaseStatus::Success, "{}", performed.output());
    assert!(orchestrator.manager.prepared_release(&release_id).is_none());
    let requests = orchestrator.goals.requests();
    let request = requests.last().ok_or_else(|| eyre!("no goal request"))?;
    assert_eq!(request.directory, orchestrator.build_directory("a"));
    assert_eq!(request.goals, "deploy");
    assert_eq!(request.arguments.as_deref(), Some("-DperformRelease=true"));
    orchestrator.shutdown()
}

#[rstest]
fn failed_perform_keeps_the_release_prepared_for_a_retry(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new().fail_on("deploy"))?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;
    let since = Utc::now();
    let release_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(project))?;
    rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    let listener = RecordingReleaseListener::new();
    let since = Utc::now();
    let admitted = orchestrator.manager.perform(
        PerformReleaseRequest::new(release_id.clone(), orchestrator.build_directory("a"))
            .with_listener(Arc::new(listener.clone())),
    )?;
    let failed = rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Perform, since))?;

    assert_eq!(admitted, PerformAdmission::Enqueued);
    assert_eq!(failed.status(), ReleaseStatus::Failure);
    assert!(failed.error().is_some_and(|reason| reason.contains("deploy")));
    assert_eq!(listener.errors().len(), 1);
    assert!(orchestrator.manager.prepared_release(&release_id).is_some());

    let since = Utc::now();
    let retried = orchestrator.manager.perform(
        PerformReleaseRequest::new(release_id.clone(), orchestrator.build_directory("a"))
            .with_goals("install"),
    )?;
    let performed =
        rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Perform, since))?;

    assert_eq!(retried, PerformAdmission::Enqueued);
    assert_eq!(performed.status(), ReleaseStatus::Success, "{}", performed.output());
    assert!(orchestrator.manager.prepared_release(&release_id).is_none());
    orchestrator.shutdown()
}

#[rstest]
fn perform_of_an_unprepared_release_is_not_queued() -> eyre::Result<()> {
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let release_id = marshal::release::domain::ReleaseId::new("g:never")?;

    let admitted = orchestrator.manager.perform(PerformReleaseRequest::new(
        release_id.clone(),
        orchestrator.build_directory("never"),
    ))?;

    assert_eq!(admitted, PerformAdmission::NotPrepared);
    assert!(orchestrator.manager.release_result(&release_id).is_none());
    assert!(orchestrator.goals.requests().is_empty());
    orchestrator.shutdown()
}

#[rstest]
fn rollback_restores_the_working_copy(runtime: io::Result<Runtime>) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;
    let since = Utc::now();
    let release_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(project))?;
    rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    let since = Utc::now();
    rt.block_on(orchestrator.manager.rollback(
        release_id.clone(),
        &orchestrator.working_directory("a"),
        None,
    ))
    .wrap_err("queue rollback")?;
    let rolled_back =
        rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Rollback, since))?;

    assert_eq!(rolled_back.status(), ReleaseStatus::Success, "{}", rolled_back.output());
    assert_eq!(
        orchestrator.working_file("a", "project.toml")?,
        manifest("g", "a", "1.0-SNAPSHOT")
    );
    assert!(orchestrator.scm.tags("mem://g/a").is_empty());
    assert!(
        !orchestrator
            .working_directory("a")
            .join(DESCRIPTOR_FILE_NAME)
            .exists()
    );
    assert!(orchestrator.manager.prepared_release(&release_id).is_none());
    orchestrator.shutdown()
}

#[rstest]
fn persisted_release_is_performed_after_a_restart(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;
    let since = Utc::now();
    let release_id = orchestrator
        .manager
        .prepare(orchestrator.prepare_request(project))?;
    rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    let restarted = orchestrator.restart()?;
    let request =
        PerformReleaseRequest::new(release_id.clone(), restarted.build_directory("a"));
    let admitted = restarted.manager.perform(request.clone())?;
    assert_eq!(admitted, PerformAdmission::NotPrepared);

    let since = Utc::now();
    rt.block_on(
        restarted
            .manager
            .perform_from_working_directory(request, &restarted.working_directory("a")),
    )
    .wrap_err("queue perform from working directory")?;
    let performed = rt.block_on(restarted.wait_for(&release_id, ReleaseOperation::Perform, since))?;

    assert_eq!(performed.status(), ReleaseStatus::Success, "{}", performed.output());
    restarted.shutdown()
}

#[rstest]
fn prepare_of_an_unknown_repository_fails_through_the_listener(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new())?;
    let project = marshal::release::domain::ProjectDescriptor::new("g", "lost", "mem://g/lost");
    let listener = RecordingReleaseListener::new();

    let since = Utc::now();
    let release_id = orchestrator.manager.prepare(
        orchestrator
            .prepare_request(project)
            .with_listener(Arc::new(listener.clone())),
    )?;
    let failed = rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(failed.status(), ReleaseStatus::Failure);
    assert_eq!(listener.errors().len(), 1);
    assert_eq!(listener.started_phases(), ["update-working-copy"]);
    assert!(orchestrator.manager.prepared_releases().is_empty());
    orchestrator.shutdown()
}

#[rstest]
fn prepare_failing_after_the_release_rewrite_can_be_rolled_back(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new().fail_on("verify"))?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;

    let since = Utc::now();
    let release_id = orchestrator.manager.prepare(
        orchestrator
            .prepare_request(project)
            .with_properties(ReleaseProperties::new().with_preparation_goals("verify")),
    )?;
    let failed = rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(failed.status(), ReleaseStatus::Failure);
    assert!(orchestrator.working_file("a", "project.toml")?.contains("\"1.0\""));
    assert!(
        orchestrator
            .working_directory("a")
            .join("project.toml.releaseBackup")
            .exists()
    );
    assert!(orchestrator.manager.prepared_release(&release_id).is_none());

    let since = Utc::now();
    rt.block_on(orchestrator.manager.rollback(
        release_id.clone(),
        &orchestrator.working_directory("a"),
        None,
    ))
    .wrap_err("queue rollback after failed prepare")?;
    let rolled_back =
        rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Rollback, since))?;

    assert_eq!(rolled_back.status(), ReleaseStatus::Success, "{}", rolled_back.output());
    assert_eq!(
        orchestrator.working_file("a", "project.toml")?,
        manifest("g", "a", "1.0-SNAPSHOT")
    );
    assert!(
        !orchestrator
            .working_directory("a")
            .join("project.toml.releaseBackup")
            .exists()
    );
    assert!(
        !orchestrator
            .working_directory("a")
            .join(DESCRIPTOR_FILE_NAME)
            .exists()
    );
    orchestrator.shutdown()
}

#[rstest]
fn failed_prepare_resumes_from_its_persisted_progress(
    runtime: io::Result<Runtime>,
) -> eyre::Result<()> {
    let rt = runtime?;
    let orchestrator = Orchestrator::start(InMemoryGoalExecutor::new().fail_on("verify"))?;
    let project = orchestrator.add_project("g", "a", "1.0-SNAPSHOT")?;
    let since = Utc::now();
    let release_id = orchestrator.manager.prepare(
        orchestrator
            .prepare_request(project)
            .with_properties(ReleaseProperties::new().with_preparation_goals("verify")),
    )?;
    let failed = rt.block_on(orchestrator.wait_for(&release_id, ReleaseOperation::Prepare, since))?;
    assert_eq!(failed.status(), ReleaseStatus::Failure);

    let restarted = orchestrator.restart_with_goals(InMemoryGoalExecutor::new())?;
    let listener = RecordingReleaseListener::new();
    let since = Utc::now();
    rt.block_on(restarted.manager.resume_prepare(
        release_id.clone(),
        &restarted.working_directory("a"),
        Some(Arc::new(listener.clone())),
    ))
    .wrap_err("queue resumed prepare")?;
    let resumed = rt.block_on(restarted.wait_for(&release_id, ReleaseOperation::Prepare, since))?;

    assert_eq!(resumed.status(), ReleaseStatus::Success, "{}", resumed.output());
    assert_eq!(listener.skipped_phases().len(), 5);
    assert_eq!(
        listener.started_phases().first().map(String::as_str),
        Some("run-preparation-goals")
    );
    assert_eq!(restarted.scm.tags("mem://g/a"), ["a-1.0"]);
    assert!(restarted.working_file("a", "project.toml")?.contains("1.1-SNAPSHOT"));
    assert!(restarted.manager.prepared_release(&release_id).is_some());
    restarted.shutdown()
}
