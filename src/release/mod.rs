//! Release lifecycle orchestration.
//!
//! Turns a request to release a project into an asynchronous prepare,
//! perform and rollback workflow. Requests are admitted by the
//! [`services::ReleaseManager`] into one FIFO queue per operation; a
//! dedicated worker per queue drives the [`ports::ReleaseEngine`] and
//! publishes results into shared state. The provided
//! [`pipeline::PipelineReleaseEngine`] runs ordered phases that mutate a
//! persisted [`domain::ReleaseDescriptor`].
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Phase pipeline in [`pipeline`]
//! - Queues, workers and the manager in [`services`]

pub mod adapters;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
