//! Marshal: release lifecycle orchestration.
//!
//! This crate turns a request to release a project into a durable,
//! asynchronous prepare, perform and rollback workflow executed by
//! background workers, with release state shared safely across concurrent
//! requests for different projects.
//!
//! # Architecture
//!
//! Marshal follows hexagonal architecture principles:
//!
//! - **Domain**: Pure release model with no infrastructure dependencies
//! - **Ports**: Trait interfaces for source control, the build tool,
//!   manifests, descriptor persistence and the release engine
//! - **Adapters**: Concrete implementations of ports (filesystem, processes,
//!   in-memory)
//!
//! # Modules
//!
//! - [`release`]: Release domain, phase pipeline, queues and workers
//! - [`config`]: Layered runtime configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod release;
pub mod telemetry;
