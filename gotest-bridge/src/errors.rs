// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gotest-bridge.
//!
//! Note that a malformed line in the event stream is *not* an error: it switches the run over to
//! the raw-log fallback instead. See [`aggregator`](crate::aggregator).

use crate::config::ConfigExperimental;
use camino::{FromPathBufError, Utf8PathBuf};
use config::ConfigError;
use itertools::Itertools;
use std::io;
use thiserror::Error;

/// An error that occurred while locating or reading a `go.mod` file.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No `go.mod` was found in the start directory or any ancestor.
    #[error("no `go.mod` found in `{start}` or any of its ancestors")]
    NotFound {
        /// The directory the search started from.
        start: Utf8PathBuf,
    },

    /// The `go.mod` file could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// The path to the manifest.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The `go.mod` file has no `module` directive.
    #[error("no `module` directive found in `{path}`")]
    NoModuleDirective {
        /// The path to the manifest.
        path: Utf8PathBuf,
    },
}

/// An error that occurred while reading declarations from a Go source file.
#[derive(Debug, Error)]
#[error("failed to read `{path}`")]
pub struct SourceFileError {
    path: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl SourceFileError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while persisting output to an
/// [`OutputStore`](crate::output_store::OutputStore).
#[derive(Debug, Error)]
pub enum OutputStoreError {
    /// The store directory could not be created.
    #[error("failed to create output store directory `{dir}`")]
    CreateDir {
        /// The directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The default store directory is not valid UTF-8.
    #[error("output store directory is not valid UTF-8")]
    NonUtf8Dir {
        /// The underlying error.
        #[source]
        error: FromPathBufError,
    },

    /// Writing an output file failed.
    #[error("failed to write output for `{key}` in `{dir}`")]
    Write {
        /// The key (position ID) the output belongs to.
        key: String,

        /// The store directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while reconciling aggregated tests with a position tree.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The Go module could not be determined, so no runtime identities can be matched.
    #[error("failed to determine the Go module for the project")]
    Module(#[from] ModuleError),

    /// Persisting output failed.
    #[error("failed to persist test output")]
    OutputStore(#[from] OutputStoreError),
}

/// An error that occurred while building a test invocation.
#[derive(Debug, Error)]
pub enum InvocationBuildError {
    /// The requested position is not in the tree.
    #[error("position `{id}` not found in the position tree")]
    PositionNotFound {
        /// The requested ID.
        id: String,
    },

    /// The source file for the position could not be read.
    #[error("failed to read source file for position `{id}`")]
    SourceFile {
        /// The position ID.
        id: String,

        /// The underlying error.
        #[source]
        error: SourceFileError,
    },

    /// A namespace position's file has no `package` declaration on its first line.
    #[error("no `package` declaration on the first line of `{path}`")]
    PackageNotDeclared {
        /// The source file.
        path: Utf8PathBuf,
    },

    /// The position's path has no parent directory to run in.
    #[error("path `{path}` has no parent directory")]
    NoParentDir {
        /// The source file.
        path: Utf8PathBuf,
    },
}

/// An error that occurred while parsing the gotest-bridge config.
#[derive(Debug, Error)]
#[error("failed to parse gotest-bridge config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// The config sources could not be combined.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The combined config could not be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// Error returned when parsing an unknown experimental feature name.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error(
    "unknown experimental feature `{feature}`; known features: {}",
    ConfigExperimental::all().iter().map(|f| f.name()).join(", ")
)]
pub struct UnknownExperimentalError {
    /// The unknown feature name.
    pub feature: String,
}
