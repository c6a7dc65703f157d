// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display decoration for test output lines.

use owo_colors::{OwoColorize, Style};

/// Styles used to decorate output lines.
///
/// Uncolorized by default, in which case decoration leaves lines untouched. Call
/// [`colorize`](Self::colorize) to enable color escapes.
#[derive(Clone, Debug, Default)]
pub struct OutputStyles {
    is_colorized: bool,
    fail: Style,
    pass: Style,
    skip: Style,
}

impl OutputStyles {
    /// Returns colorized styles.
    pub fn colorized() -> Self {
        let mut styles = Self::default();
        styles.colorize();
        styles
    }

    /// Enables color escapes.
    pub fn colorize(&mut self) {
        self.is_colorized = true;
        self.fail = Style::new().red();
        self.pass = Style::new().green();
        self.skip = Style::new().yellow();
    }

    /// Returns true if color escapes are enabled.
    pub fn is_colorized(&self) -> bool {
        self.is_colorized
    }

    /// Decorates a line by a literal substring match on `FAIL`, `PASS` and `SKIP`, in that order.
    /// The first match wins.
    pub fn decorate(&self, line: &str) -> String {
        let style = if line.contains("FAIL") {
            self.fail
        } else if line.contains("PASS") {
            self.pass
        } else if line.contains("SKIP") {
            self.skip
        } else {
            return line.to_owned();
        };

        if self.is_colorized {
            line.style(style).to_string()
        } else {
            line.to_owned()
        }
    }
}
