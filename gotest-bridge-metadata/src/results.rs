// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// The terminal status of a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test passed.
    Passed,

    /// The test failed, or its outcome could not be confirmed.
    Failed,

    /// The test was skipped.
    Skipped,
}

impl TestStatus {
    /// Returns the name of this status as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque reference to persisted test output.
///
/// For the directory-backed store this is a file path, but consumers should
/// not rely on that.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputHandle(String);

impl OutputHandle {
    /// Creates a new handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An error annotation attributed to a line of a test file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultError {
    /// The line number, as printed by the test runner (1-based).
    pub line: u32,

    /// The output fragments attributed to this line, joined with newlines.
    pub message: String,
}

/// The result for a single position.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReconciledResult {
    /// The status of the position.
    pub status: TestStatus,

    /// The full output for this position.
    pub output: OutputHandle,

    /// The output joined for inline display. Not set for fallback results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Line-attributed errors, ordered by line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ResultError>>,
}

/// How a set of [`RunResults`] was produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunResultsKind {
    /// Results were matched position by position against the event stream.
    Reconciled,

    /// A line of the event stream could not be decoded. Every position is
    /// marked failed and shares the raw log.
    StreamFallback,

    /// The event stream decoded, but did not mention any test. Every position
    /// is marked failed and shares the raw log.
    NoTestsTracked,
}

/// The results of a run, keyed by position ID.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    /// How these results were produced.
    pub kind: RunResultsKind,

    /// Results by position ID. Positions without a runtime counterpart are absent.
    pub results: BTreeMap<String, ReconciledResult>,
}

impl RunResults {
    /// Returns the result for a position, if any.
    pub fn get(&self, id: &str) -> Option<&ReconciledResult> {
        self.results.get(id)
    }

    /// Returns true if any position failed.
    pub fn has_failures(&self) -> bool {
        self.results
            .values()
            .any(|result| result.status == TestStatus::Failed)
    }

    /// Returns true if results were produced by one of the fallback policies.
    pub fn is_fallback(&self) -> bool {
        !matches!(self.kind, RunResultsKind::Reconciled)
    }
}
