//! Runs one release operation against a local working copy.
//!
//! Usage:
//!
//! ```text
//! marshal [--config <path>] prepare <group:artifact> <scm-url> <working-dir>
//! marshal [--config <path>] perform <group:artifact> <working-dir> <build-dir>
//! marshal [--config <path>] rollback <group:artifact> <working-dir>
//! ```
//!
//! `perform` and `rollback` read the descriptor persisted by a previous
//! `prepare` in `working-dir`. Settings come from the optional TOML file and
//! `MARSHAL_*` environment variables; the outcome is reported through
//! `tracing` and the exit status.

use std::{env, sync::Arc, time::Duration};

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use marshal::{
    config::{ReleaseConfig, ReleaseConfigError},
    release::{
        adapters::{
            fs::{FileDescriptorStore, TomlProjectManifests},
            process::CommandGoalExecutor,
        },
        domain::{
            ModuleKey, ProjectDescriptor, ReleaseDomainError, ReleaseId, ReleaseOperation,
            ReleaseResult,
        },
        pipeline::{PipelineCollaborators, PipelineReleaseEngine},
        ports::ProjectManifests,
        services::{
            PerformReleaseRequest, PrepareReleaseRequest, ReleaseManager, ReleaseManagerError,
            ReleaseState, ReleaseTaskExecutor, WorkerError, spawn_release_workers,
        },
    },
    telemetry::init_tracing,
};
use mockable::DefaultClock;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ReleaseConfigError),
    #[error("tracing init failed: {0}")]
    Tracing(String),
    #[error(transparent)]
    Domain(#[from] ReleaseDomainError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error(transparent)]
    Workers(#[from] WorkerError),
    #[error(transparent)]
    Manager(#[from] ReleaseManagerError),
    #[error("{operation} of {release_id} failed: {reason}")]
    Failed {
        operation: ReleaseOperation,
        release_id: ReleaseId,
        reason: String,
    },
}

#[derive(Debug)]
enum Command {
    Prepare {
        key: ModuleKey,
        scm_url: String,
        working_directory: Utf8PathBuf,
    },
    Perform {
        key: ModuleKey,
        working_directory: Utf8PathBuf,
        build_directory: Utf8PathBuf,
    },
    Rollback {
        key: ModuleKey,
        working_directory: Utf8PathBuf,
    },
}

impl Command {
    const fn operation(&self) -> ReleaseOperation {
        match self {
            Self::Prepare { .. } => ReleaseOperation::Prepare,
            Self::Perform { .. } => ReleaseOperation::Perform,
            Self::Rollback { .. } => ReleaseOperation::Rollback,
        }
    }

    const fn key(&self) -> &ModuleKey {
        match self {
            Self::Prepare { key, .. } | Self::Perform { key, .. } | Self::Rollback { key, .. } => {
                key
            }
        }
    }
}

fn main() -> Result<(), BoxError> {
    let args = collect_args()?;
    let (config_path, command) = parse_args(args)?;
    let config = ReleaseConfig::load(config_path.as_deref())?;
    init_tracing(&config.log_filter).map_err(|err| CliError::Tracing(err.to_string()))?;
    run(&config, command).map_err(|err| {
        error!(error = %err, "release command failed");
        err.into()
    })
}

fn collect_args() -> Result<Vec<String>, CliError> {
    env::args_os()
        .skip(1)
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| CliError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect()
}

fn parse_args(args: Vec<String>) -> Result<(Option<Utf8PathBuf>, Command), CliError> {
    let mut remaining = args.into_iter();
    let mut config_path = None;
    let mut operation = remaining.next();
    if operation.as_deref() == Some("--config") {
        config_path = remaining.next().map(Utf8PathBuf::from);
        if config_path.is_none() {
            return Err(CliError::InvalidArgs("--config needs a path".into()));
        }
        operation = remaining.next();
    }
    let operands: Vec<String> = remaining.collect();
    let command = match (operation.as_deref(), operands.as_slice()) {
        (Some("prepare"), [key, scm_url, working_directory]) => Command::Prepare {
            key: ModuleKey::parse(key)?,
            scm_url: scm_url.clone(),
            working_directory: Utf8PathBuf::from(working_directory),
        },
        (Some("perform"), [key, working_directory, build_directory]) => Command::Perform {
            key: ModuleKey::parse(key)?,
            working_directory: Utf8PathBuf::from(working_directory),
            build_directory: Utf8PathBuf::from(build_directory),
        },
        (Some("rollback"), [key, working_directory]) => Command::Rollback {
            key: ModuleKey::parse(key)?,
            working_directory: Utf8PathBuf::from(working_directory),
        },
        (Some(other @ ("prepare" | "perform" | "rollback")), _) => {
            return Err(CliError::InvalidArgs(format!(
                "wrong number of operands for '{other}'"
            )));
        }
        (Some(other), _) => {
            return Err(CliError::InvalidArgs(format!(
                "unknown operation '{other}'; expected prepare, perform, or rollback"
            )));
        }
        (None, _) => return Err(CliError::InvalidArgs("missing operation".into())),
    };
    Ok((config_path, command))
}

fn run(config: &ReleaseConfig, command: Command) -> Result<(), CliError> {
    let manifests: Arc<dyn ProjectManifests> = Arc::new(TomlProjectManifests::new());
    let store = Arc::new(FileDescriptorStore::new());
    let collaborators = config.configure_pipeline(PipelineCollaborators::new(
        Arc::new(config.git_client()),
        Arc::new(CommandGoalExecutor::new()),
        Arc::clone(&manifests),
        store.clone(),
    ));
    let state = Arc::new(ReleaseState::new());
    let executor = Arc::new(config.configure_executor(ReleaseTaskExecutor::new(
        Arc::new(PipelineReleaseEngine::new(&collaborators)),
        Arc::new(DefaultClock),
        Arc::clone(&state),
        config.settings_source(),
        manifests,
    )));
    let (queues, workers) = spawn_release_workers(&executor)?;
    let manager = ReleaseManager::new(state, queues, store)
        .with_manifest_file_name(config.manifest_file_name.clone());

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeInit)?;
    let outcome = runtime.block_on(submit_and_wait(&manager, command));
    drop(manager);
    workers.join()?;
    let result = outcome?;
    info!(
        operation = %result.operation(),
        status = %result.status(),
        run_id = %result.run_id(),
        "release command finished"
    );
    Ok(())
}

async fn submit_and_wait(
    manager: &ReleaseManager<FileDescriptorStore>,
    command: Command,
) -> Result<ReleaseResult, CliError> {
    let operation = command.operation();
    let module = command.key();
    let release_id = ReleaseId::from_coordinates(module.group(), module.artifact())?;
    let since = Utc::now();
    match command {
        Command::Prepare {
            key,
            scm_url,
            working_directory,
        } => {
            let project = ProjectDescriptor::new(key.group(), key.artifact(), scm_url);
            manager.prepare(PrepareReleaseRequest::new(project, working_directory))?;
        }
        Command::Perform {
            working_directory,
            build_directory,
            ..
        } => {
            let request = PerformReleaseRequest::new(release_id.clone(), build_directory);
            manager
                .perform_from_working_directory(request, &working_directory)
                .await?;
        }
        Command::Rollback {
            working_directory, ..
        } => {
            manager
                .rollback(release_id.clone(), &working_directory, None)
                .await?;
        }
    }
    let result = wait_for(manager, &release_id, operation, since).await;
    if result.status().is_success() {
        Ok(result)
    } else {
        Err(CliError::Failed {
            operation,
            release_id,
            reason: result.error().unwrap_or("unknown failure").to_owned(),
        })
    }
}

async fn wait_for(
    manager: &ReleaseManager<FileDescriptorStore>,
    release_id: &ReleaseId,
    operation: ReleaseOperation,
    since: DateTime<Utc>,
) -> ReleaseResult {
    loop {
        let finished = manager.release_result(release_id).filter(|result| {
            result.operation() == operation
                && result.start_time() >= since
                && result.end_time().is_some()
        });
        if let Some(result) = finished {
            return result;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, Command, parse_args};
    use camino::Utf8Path;
    use rstest::rstest;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[rstest]
    fn prepare_takes_a_key_url_and_working_directory() {
        let (config, command) =
            parse_args(args(&["prepare", "g:a", "https://example.com/a.git", "/work/a"]))
                .expect("valid prepare");

        assert!(config.is_none());
        let Command::Prepare {
            key,
            scm_url,
            working_directory,
        } = command
        else {
            panic!("expected prepare");
        };
        assert_eq!(key.to_string(), "g:a");
        assert_eq!(scm_url, "https://example.com/a.git");
        assert_eq!(working_directory, "/work/a");
    }

    #[rstest]
    fn config_flag_precedes_the_operation() {
        let (config, command) =
            parse_args(args(&["--config", "/etc/marshal.toml", "rollback", "g:a", "/work/a"]))
                .expect("valid rollback");

        assert_eq!(config.as_deref(), Some(Utf8Path::new("/etc/marshal.toml")));
        assert!(matches!(command, Command::Rollback { .. }));
    }

    #[rstest]
    #[case(&[])]
    #[case(&["publish", "g:a"])]
    #[case(&["perform", "g:a", "/work/a"])]
    #[case(&["--config"])]
    fn malformed_arguments_are_rejected(#[case] values: &[&str]) {
        let result = parse_args(args(values));

        assert!(matches!(result, Err(CliError::InvalidArgs(_))));
    }

    #[rstest]
    fn invalid_module_key_is_a_domain_error() {
        let result = parse_args(args(&["rollback", "no-colon", "/work/a"]));

        assert!(matches!(result, Err(CliError::Domain(_))));
    }
}
