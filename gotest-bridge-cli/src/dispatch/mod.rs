// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command dispatch and execution.

mod app;
mod commands;
mod common;

pub use app::GotestBridgeApp;
