// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::identity::TEST_FILE_PATTERN;
use regex::Regex;
use std::sync::LazyLock;

// `t.Error` and friends print `    <file>_test.go:<line>: <message>`, indented further for
// subtests.
static FILE_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"    ({TEST_FILE_PATTERN}):(\d+):")).expect("regex is valid")
});

/// A `file:line:` annotation found in a single output event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileLocation<'a> {
    /// The test file name, for example `foo_test.go`.
    pub file: &'a str,

    /// The line number as printed.
    pub line: u32,

    /// Everything after the annotation, unsanitized.
    pub message: &'a str,
}

impl<'a> FileLocation<'a> {
    /// Extracts the location annotation from a raw output string.
    ///
    /// Returns `None` if the output has no annotation.
    pub fn extract(output: &'a str) -> Option<Self> {
        let captures = FILE_LOCATION.captures(output)?;
        let whole = captures.get(0)?;
        let line = captures.get(2)?.as_str().parse().ok()?;
        Some(Self {
            file: captures.get(1)?.as_str(),
            line,
            message: &output[whole.end()..],
        })
    }
}
