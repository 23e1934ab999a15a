//! Descriptor store persisting `release-descriptor.json` in the working
//! directory.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use std::io;

use crate::release::{
    domain::ReleaseDescriptor,
    ports::{DescriptorStore, DescriptorStoreError, DescriptorStoreResult},
};

/// File name of the persisted descriptor inside a working directory.
pub const DESCRIPTOR_FILE_NAME: &str = "release-descriptor.json";

/// Descriptor store writing JSON next to the project being released.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDescriptorStore;

impl FileDescriptorStore {
    /// Creates the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn open_existing(working_directory: &Utf8Path) -> DescriptorStoreResult<Dir> {
    Dir::open_ambient_dir(working_directory, ambient_authority()).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            DescriptorStoreError::NotFound(working_directory.to_path_buf())
        } else {
            DescriptorStoreError::persistence(err)
        }
    })
}

#[async_trait]
impl DescriptorStore for FileDescriptorStore {
    async fn read(&self, partial: &ReleaseDescriptor) -> DescriptorStoreResult<ReleaseDescriptor> {
        let working_directory = &partial.working_directory;
        let dir = open_existing(working_directory)?;
        let contents = dir.read_to_string(DESCRIPTOR_FILE_NAME).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                DescriptorStoreError::NotFound(working_directory.clone())
            } else {
                DescriptorStoreError::persistence(err)
            }
        })?;
        let stored: ReleaseDescriptor =
            serde_json::from_str(&contents).map_err(|err| DescriptorStoreError::Corrupt {
                path: working_directory.clone(),
                reason: err.to_string(),
            })?;
        Ok(stored.merged_with(partial))
    }

    async fn write(&self, descriptor: &ReleaseDescriptor) -> DescriptorStoreResult<()> {
        let working_directory = &descriptor.working_directory;
        Dir::create_ambient_dir_all(working_directory, ambient_authority())
            .map_err(DescriptorStoreError::persistence)?;
        let dir = open_existing(working_directory)?;
        let contents =
            serde_json::to_string_pretty(descriptor).map_err(DescriptorStoreError::persistence)?;
        dir.write(DESCRIPTOR_FILE_NAME, contents)
            .map_err(DescriptorStoreError::persistence)
    }

    async fn delete(&self, working_directory: &Utf8Path) -> DescriptorStoreResult<()> {
        let dir = match open_existing(working_directory) {
            Ok(dir) => dir,
            Err(DescriptorStoreError::NotFound(_)) => return Ok(()),
            Err(err) => return Err(err),
        };
        match dir.remove_file(DESCRIPTOR_FILE_NAME) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DescriptorStoreError::persistence(err)),
        }
    }
}
