// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of the `go test -json` event stream into per-test state.
//!
//! Each line of the stream is decoded independently and folded into an [`AggregatedTest`] keyed
//! by runtime identity. Output from a subtest is also forwarded to every tracked enclosing test.
//!
//! Decoding is all-or-nothing: as soon as one line fails to decode (for example because the
//! package failed to compile and `go test` printed plain text), everything aggregated so far is
//! discarded and the run is reported as a decorated raw log instead.

mod event;
mod imp;
mod location;

pub use event::*;
pub use imp::*;
pub use location::*;
