// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the data exchanged with
//! [gotest-bridge](https://crates.io/crates/gotest-bridge).
//!
//! Editor integrations hand gotest-bridge a [`PositionTree`] of discovered Go
//! tests, and get back [`RunResults`] keyed by position ID. Both are plain
//! serde types, so consumers in other processes can read and write them as
//! JSON.

mod exit_codes;
mod position;
mod results;

pub use exit_codes::*;
pub use position::*;
pub use results::*;
