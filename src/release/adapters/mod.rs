//! Adapter implementations of the release ports.
//!
//! # Available Adapters
//!
//! - [`listener::LoggingReleaseListener`]: default listener emitting tracing
//!   events
//! - [`memory`]: deterministic in-memory SCM, goal executor, descriptor store
//!   and recording listener
//! - [`fs`]: JSON descriptor store and TOML manifests on the real filesystem
//! - [`process`]: `git` and build-tool adapters over system processes
//! - [`settings`]: static and file-backed tool settings

pub mod fs;
pub mod listener;
pub mod memory;
pub mod process;
pub mod settings;
