// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for gotest-bridge: connects `go test -json` output to a tree of test
//! positions discovered by an editor integration.
//!
//! The basic flow is:
//!
//! 1. [`invocation::InvocationBuilder`] builds the `go test` invocation for a selected position.
//! 2. The caller runs it, and feeds every line of its standard output to an
//!    [`aggregator::EventAggregator`].
//! 3. [`reconcile::reconcile`] matches the aggregated tests back to positions, persisting output
//!    through an [`output_store::OutputStore`].
//!
//! Identities are translated between the position tree and the event stream by
//! [`identity`].

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod identity;
pub mod invocation;
pub mod module;
pub mod output_store;
pub mod reconcile;
pub mod source;
pub mod styles;
