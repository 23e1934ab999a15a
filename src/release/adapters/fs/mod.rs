//! Filesystem adapters: the JSON descriptor store and TOML manifests.
//!
//! All access goes through `cap-std` directories opened with ambient
//! authority at the working directory.

mod descriptor_store;
mod manifests;

pub use descriptor_store::{DESCRIPTOR_FILE_NAME, FileDescriptorStore};
pub use manifests::TomlProjectManifests;
