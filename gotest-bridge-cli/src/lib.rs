// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line interface for gotest-bridge.
//!
//! Builds `go test` invocations for positions in an editor's test tree, and reconciles the
//! resulting `go test -json` stream back into per-position results.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
