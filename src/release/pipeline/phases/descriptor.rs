//! Descriptor persistence phases.

use async_trait::async_trait;
use std::sync::Arc;

use crate::release::{
    domain::{ReactorProject, ReleaseDescriptor, ReleaseEnvironment},
    pipeline::{PhaseReport, PhaseResult, ReleasePhase},
    ports::DescriptorStore,
};

const END_RELEASE: &str = "end-release";

/// Marks the prepare sequence complete and persists the descriptor.
pub struct EndReleasePhase {
    store: Arc<dyn DescriptorStore>,
}

impl EndReleasePhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(store: Arc<dyn DescriptorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReleasePhase for EndReleasePhase {
    fn name(&self) -> &'static str {
        END_RELEASE
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        descriptor.completed_phase = Some(END_RELEASE.to_owned());
        self.store.write(descriptor).await?;
        Ok(PhaseReport::line(format!(
            "release descriptor written to {}",
            descriptor.working_directory
        )))
    }
}

/// Deletes the persisted descriptor from the working directory.
pub struct RemoveReleaseDescriptorPhase {
    store: Arc<dyn DescriptorStore>,
}

impl RemoveReleaseDescriptorPhase {
    /// Creates the phase.
    #[must_use]
    pub fn new(store: Arc<dyn DescriptorStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReleasePhase for RemoveReleaseDescriptorPhase {
    fn name(&self) -> &'static str {
        "remove-release-descriptor"
    }

    async fn execute(
        &self,
        descriptor: &mut ReleaseDescriptor,
        _environment: &ReleaseEnvironment,
        _reactor_projects: &mut Vec<ReactorProject>,
    ) -> PhaseResult {
        self.store.delete(&descriptor.working_directory).await?;
        Ok(PhaseReport::line(format!(
            "release descriptor removed from {}",
            descriptor.working_directory
        )))
    }
}
