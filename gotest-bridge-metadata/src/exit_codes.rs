// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `gotest-bridge` failures.
///
/// `gotest-bridge` may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum GotestBridgeExitCode {}

impl GotestBridgeExitCode {
    /// No errors occurred and every reconciled position passed or was skipped.
    pub const OK: i32 = 0;

    /// One or more positions failed, including every position of a run that tracked no tests.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// The event stream could not be parsed, so every position was marked failed.
    pub const STREAM_FALLBACK: i32 = 101;

    /// No `go.mod` could be found (or read) for the project, so no results could be produced.
    pub const NO_MODULE: i32 = 102;

    /// Building the test invocation failed.
    pub const INVOCATION_BUILD_FAILED: i32 = 103;

    /// Persisting test output to the output store failed.
    pub const OUTPUT_STORE_FAILED: i32 = 104;

    /// A user issue happened while setting up a gotest-bridge invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
