// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarations read from the first line of a Go source file.
//!
//! Only the first line is consulted. A file either starts with its `package` clause, or with a
//! build constraint comment (`//go:build` or the legacy `// +build`).

use crate::errors::SourceFileError;
use camino::Utf8Path;
use itertools::Itertools;
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    sync::LazyLock,
};

static PACKAGE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^package\s+([A-Za-z_]\w*)").expect("regex is valid"));

static GO_BUILD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//go:build\s+(.+)$").expect("regex is valid"));

static PLUS_BUILD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//\s*\+build\s+(.+)$").expect("regex is valid"));

static BUILD_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)([\w.]+)").expect("regex is valid"));

/// The first line of a Go source file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceHeader {
    first_line: String,
}

impl SourceHeader {
    /// Reads the first line of the file at `path`.
    pub fn read(path: &Utf8Path) -> Result<Self, SourceFileError> {
        let file = File::open(path).map_err(|error| SourceFileError::new(path, error))?;
        let mut first_line = String::new();
        BufReader::new(file)
            .read_line(&mut first_line)
            .map_err(|error| SourceFileError::new(path, error))?;
        Ok(Self::from_line(first_line))
    }

    /// Creates a header from an already-read line.
    pub fn from_line(line: impl Into<String>) -> Self {
        let mut first_line = line.into();
        let trimmed_len = first_line.trim_end_matches(['\r', '\n']).len();
        first_line.truncate(trimmed_len);
        Self { first_line }
    }

    /// Returns the package name, if the first line is a `package` clause.
    pub fn package_name(&self) -> Option<&str> {
        PACKAGE_CLAUSE
            .captures(&self.first_line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }

    /// Returns the build tags the file is constrained on, if the first line is a build
    /// constraint.
    ///
    /// Negated tags (`!windows`) are not included, since they cannot be satisfied by passing
    /// `-tags`.
    pub fn build_tags(&self) -> Vec<&str> {
        let Some(expr) = GO_BUILD
            .captures(&self.first_line)
            .or_else(|| PLUS_BUILD.captures(&self.first_line))
            .and_then(|captures| captures.get(1))
        else {
            return Vec::new();
        };

        BUILD_TAG
            .captures_iter(expr.as_str())
            .filter(|captures| captures[1].is_empty())
            .filter_map(|captures| captures.get(2))
            .map(|m| m.as_str())
            .unique()
            .collect()
    }

    /// Returns the `-tags=...` flag to pass to `go test`, if the file has build tags.
    pub fn tags_flag(&self) -> Option<String> {
        let tags = self.build_tags();
        (!tags.is_empty()).then(|| format!("-tags={}", tags.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("package foo\n", Some("foo") ; "plain")]
    #[test_case("package foo_test // external", Some("foo_test") ; "external test package")]
    #[test_case("//go:build integration\n", None ; "build constraint")]
    #[test_case("", None ; "empty file")]
    fn package_names(line: &str, expected: Option<&str>) {
        assert_eq!(SourceHeader::from_line(line).package_name(), expected);
    }

    #[test_case("//go:build integration\n", &["integration"] ; "go build single")]
    #[test_case(
        "//go:build integration && (linux || darwin)",
        &["integration", "linux", "darwin"]
        ; "go build expression"
    )]
    #[test_case("//go:build !windows && e2e", &["e2e"] ; "go build negation skipped")]
    #[test_case("// +build integration", &["integration"] ; "legacy single")]
    #[test_case("// +build linux,amd64 darwin", &["linux", "amd64", "darwin"] ; "legacy terms")]
    #[test_case("//+build go1.18", &["go1.18"] ; "legacy without space")]
    #[test_case("//go:build a || a", &["a"] ; "deduplicated")]
    #[test_case("package foo", &[] ; "no constraint")]
    #[test_case("// just a comment", &[] ; "plain comment")]
    fn build_tags(line: &str, expected: &[&str]) {
        assert_eq!(SourceHeader::from_line(line).build_tags(), expected);
    }

    #[test]
    fn tags_flag() {
        assert_eq!(
            SourceHeader::from_line("//go:build integration && slow").tags_flag(),
            Some("-tags=integration,slow".to_owned())
        );
        assert_eq!(SourceHeader::from_line("package foo").tags_flag(), None);
    }

    #[test]
    fn read_only_first_line() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = dir.path().join("a_test.go");
        std::fs::write(&path, "//go:build e2e\r\n\npackage foo\n").expect("wrote file");

        let header = SourceHeader::read(&path).expect("read header");
        assert_eq!(header.build_tags(), vec!["e2e"]);
        assert_eq!(header.package_name(), None);
    }
}
