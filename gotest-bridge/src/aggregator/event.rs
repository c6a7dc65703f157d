// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use gotest_bridge_metadata::TestStatus;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

/// One decoded line of the `go test -json` event stream.
///
/// Every field is optional: package-level events have no `Test`, and most actions carry no
/// `Output`. A field of the wrong type reads as absent. Fields not listed here (such as `Time`)
/// are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestEvent {
    /// The action.
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<TestAction>,

    /// The import path of the package being tested.
    #[serde(default, deserialize_with = "lenient")]
    pub package: Option<String>,

    /// The test name, with subtests separated by `/`.
    #[serde(default, deserialize_with = "lenient")]
    pub test: Option<String>,

    /// Output emitted by the test, usually including a trailing newline.
    #[serde(default, deserialize_with = "lenient")]
    pub output: Option<String>,

    /// Elapsed seconds, reported on terminal actions.
    #[serde(default, deserialize_with = "lenient")]
    pub elapsed: Option<f64>,
}

impl TestEvent {
    /// Decodes a single line of the stream.
    ///
    /// Only syntactically invalid JSON is an error. A JSON value that is not an object decodes to
    /// an event with every field absent.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        match value {
            Value::Object(_) => Self::deserialize(value),
            _ => Ok(Self::default()),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// The action reported by a [`TestEvent`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestAction {
    /// The test binary is about to start (package-level).
    Start,

    /// The test has started running.
    Run,

    /// The test has been paused.
    Pause,

    /// The test has continued running.
    Cont,

    /// A benchmark printed log output but did not fail.
    Bench,

    /// The test printed output.
    Output,

    /// The test passed.
    Pass,

    /// The test or benchmark failed.
    Fail,

    /// The test was skipped or the package contained no tests.
    Skip,

    /// An action this version does not know about.
    #[serde(other)]
    Unknown,
}

impl TestAction {
    /// Returns the terminal status for this action, or `None` for transitional and
    /// informational actions.
    pub fn terminal_status(self) -> Option<TestStatus> {
        match self {
            Self::Pass => Some(TestStatus::Passed),
            Self::Fail => Some(TestStatus::Failed),
            Self::Skip => Some(TestStatus::Skipped),
            Self::Start
            | Self::Run
            | Self::Pause
            | Self::Cont
            | Self::Bench
            | Self::Output
            | Self::Unknown => None,
        }
    }

    /// Returns the action tag as it appears in the stream.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Run => "run",
            Self::Pause => "pause",
            Self::Cont => "cont",
            Self::Bench => "bench",
            Self::Output => "output",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
