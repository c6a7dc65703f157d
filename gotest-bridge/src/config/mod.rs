// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository configuration, read from `.config/gotest-bridge.toml`.
//!
//! The config file is layered over [`BridgeConfig::DEFAULT_CONFIG`]. Unknown keys are reported as
//! warnings rather than errors, so that older versions can read newer config files.

mod experimental;
mod imp;

pub use experimental::*;
pub use imp::*;
