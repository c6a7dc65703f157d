// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for reconciled output.
//!
//! Each reconciled position gets its output written to a uniquely named artifact, identified to
//! callers by an opaque [`OutputHandle`]. Artifacts are written once and never modified.

use crate::errors::OutputStoreError;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use gotest_bridge_metadata::OutputHandle;
use std::{collections::HashMap, env, fs, io, io::Write};
use tracing::debug;

/// A sink for persisted output.
pub trait OutputStore {
    /// Persists `lines` (joined with newlines) on behalf of `key`, and returns a handle to the
    /// persisted copy.
    ///
    /// Every call produces a new artifact, even for a repeated key.
    fn persist(&mut self, key: &str, lines: &[String]) -> Result<OutputHandle, OutputStoreError>;
}

/// Stores output as files in a directory. Handles are file paths.
#[derive(Clone, Debug)]
pub struct DirOutputStore {
    dir: Utf8PathBuf,
}

impl DirOutputStore {
    /// The name of the directory under the system temp dir used by [`Self::in_temp_dir`].
    pub const TEMP_DIR_NAME: &'static str = "gotest-bridge";

    /// Creates a store writing to `dir`, creating it if necessary.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self, OutputStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|error| OutputStoreError::CreateDir {
            dir: dir.clone(),
            error,
        })?;
        Ok(Self { dir })
    }

    /// Creates a store writing to a `gotest-bridge` directory under the system temp dir.
    pub fn in_temp_dir() -> Result<Self, OutputStoreError> {
        let temp_dir = Utf8PathBuf::try_from(env::temp_dir())
            .map_err(|error| OutputStoreError::NonUtf8Dir { error })?;
        Self::new(temp_dir.join(Self::TEMP_DIR_NAME))
    }

    /// Returns the directory output is written to.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<Utf8PathBuf> {
        // Reserve a unique name first, then replace the empty file atomically.
        let path = camino_tempfile::Builder::new()
            .prefix(&file_name_prefix(key))
            .suffix(".log")
            .tempfile_in(&self.dir)?
            .into_temp_path()
            .keep()?;

        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(contents.as_bytes()))
            .map_err(|error| match error {
                atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => error,
            })?;
        Ok(path)
    }
}

impl OutputStore for DirOutputStore {
    fn persist(&mut self, key: &str, lines: &[String]) -> Result<OutputHandle, OutputStoreError> {
        let path = self
            .write(key, &lines.join("\n"))
            .map_err(|error| OutputStoreError::Write {
                key: key.to_owned(),
                dir: self.dir.clone(),
                error,
            })?;
        debug!("persisted output for `{key}` to {path}");
        Ok(OutputHandle::new(path.into_string()))
    }
}

/// Keeps output in memory. Useful for tests and for callers that display output directly.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutputStore {
    outputs: HashMap<OutputHandle, String>,
}

impl MemoryOutputStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents behind a handle.
    pub fn get(&self, handle: &OutputHandle) -> Option<&str> {
        self.outputs.get(handle).map(String::as_str)
    }

    /// Returns the number of persisted artifacts.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if nothing has been persisted.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl OutputStore for MemoryOutputStore {
    fn persist(&mut self, key: &str, lines: &[String]) -> Result<OutputHandle, OutputStoreError> {
        let handle = OutputHandle::new(format!("memory:{}:{key}", self.outputs.len()));
        self.outputs.insert(handle.clone(), lines.join("\n"));
        Ok(handle)
    }
}

fn file_name_prefix(key: &str) -> String {
    // Keys are position IDs, which contain path separators and `::`.
    let tail = key.rsplit(['/', '\\']).next().unwrap_or(key);
    let mut prefix: String = tail
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    prefix.push('-');
    prefix
}
