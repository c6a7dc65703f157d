// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use gotest_bridge::errors::{
    ConfigParseError, InvocationBuildError, OutputStoreError, ReconcileError,
};
use gotest_bridge_metadata::GotestBridgeExitCode;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are short fallbacks. Errors are printed through display_to_stderr.

/// An expected error: one caused by the environment or by input, rather than by a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("failed to read position tree")]
    TreeReadError {
        path: Utf8PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("failed to parse position tree")]
    TreeParseError {
        path: Utf8PathBuf,
        #[source]
        error: serde_json::Error,
    },
    #[error("failed to read event stream")]
    InputReadError {
        path: Option<Utf8PathBuf>,
        #[source]
        error: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to build test invocation")]
    InvocationBuildError {
        #[from]
        err: InvocationBuildError,
    },
    #[error("failed to set up output store")]
    OutputStoreError {
        #[from]
        err: OutputStoreError,
    },
    #[error("failed to reconcile results")]
    ReconcileError {
        #[from]
        err: ReconcileError,
    },
    #[error("failed to serialize output")]
    SerializeError {
        #[source]
        error: serde_json::Error,
    },
    #[error("failed to write output")]
    WriteOutputError {
        #[source]
        error: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::TreeReadError { .. }
            | Self::TreeParseError { .. }
            | Self::InputReadError { .. }
            | Self::ConfigParseError { .. } => GotestBridgeExitCode::SETUP_ERROR,
            Self::InvocationBuildError { .. } => GotestBridgeExitCode::INVOCATION_BUILD_FAILED,
            Self::OutputStoreError { .. } => GotestBridgeExitCode::OUTPUT_STORE_FAILED,
            Self::ReconcileError { err } => match err {
                ReconcileError::Module(_) => GotestBridgeExitCode::NO_MODULE,
                ReconcileError::OutputStore(_) => GotestBridgeExitCode::OUTPUT_STORE_FAILED,
            },
            Self::SerializeError { .. } | Self::WriteOutputError { .. } => {
                GotestBridgeExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::TreeReadError { path, error } => {
                error!("failed to read position tree at `{}`", path.style(styles.bold));
                Some(error as &dyn Error)
            }
            Self::TreeParseError { path, error } => {
                error!("failed to parse position tree at `{}`", path.style(styles.bold));
                Some(error as &dyn Error)
            }
            Self::InputReadError { path, error } => {
                match path {
                    Some(path) => {
                        error!("failed to read event stream from `{}`", path.style(styles.bold))
                    }
                    None => error!("failed to read event stream from standard input"),
                }
                Some(error as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::InvocationBuildError { err } => {
                error!("{err}");
                err.source()
            }
            Self::OutputStoreError { err } => {
                error!("{err}");
                err.source()
            }
            Self::ReconcileError { err } => {
                error!("{err}");
                err.source()
            }
            Self::SerializeError { error } => {
                error!("failed to serialize output");
                Some(error as &dyn Error)
            }
            Self::WriteOutputError { error } => {
                error!("failed to write output");
                Some(error as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
