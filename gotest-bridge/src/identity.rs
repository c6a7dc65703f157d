// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions between the two identity schemes for Go tests.
//!
//! * *Static* identities are assigned to positions during discovery:
//!   `<filesystem path>::<namespace>...::<test name>`, for example
//!   `/home/me/proj/pkg/foo_test.go::TestParent::sub_case`.
//! * *Runtime* identities are derived from the `go test -json` event stream:
//!   `<package>::<test>[::<subtest>...]`, for example
//!   `example.com/proj/pkg::TestParent::sub_case`.
//!
//! A static identity is mapped onto the runtime scheme by replacing the project root with the
//! module path and dropping the `_test.go` file name. Matching is exact: there is no fuzzy
//! fallback.

use crate::module::GoModule;
use camino::Utf8Path;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    borrow::{Borrow, Cow},
    fmt,
    sync::LazyLock,
};

/// The separator between components of both identity schemes.
pub const ID_SEPARATOR: &str = "::";

/// Matches a Go test file name, such as `foo_test.go` or `foo.v2_test.go`.
pub(crate) const TEST_FILE_PATTERN: &str = r"[\w.-]+_test\.[[:alnum:]]+";

static TEST_FILE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("/{TEST_FILE_PATTERN}$")).expect("regex is valid")
});

static TEST_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:^|[/\\])({TEST_FILE_PATTERN})$")).expect("regex is valid")
});

/// A runtime identity: `<package>::<test>[::<subtest>...]`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(String);

impl RuntimeId {
    /// Returns the identity as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RuntimeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The runtime identity of a test event, along with the identities of the tests enclosing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuntimeIdentity {
    id: RuntimeId,
    ancestors: Vec<RuntimeId>,
}

impl RuntimeIdentity {
    /// Computes the identity for a `Package` and `Test` pair from the event stream.
    ///
    /// Subtests are reported as `TestParent/sub_case`; every `/` becomes `::`.
    pub fn new(package: &str, test: &str) -> Self {
        let segments: Vec<&str> = test.split('/').collect();
        let prefix = |len: usize| {
            RuntimeId(format!(
                "{package}{ID_SEPARATOR}{}",
                segments[..len].join(ID_SEPARATOR)
            ))
        };

        Self {
            id: prefix(segments.len()),
            ancestors: (1..segments.len()).rev().map(prefix).collect(),
        }
    }

    /// Returns the identity of the test itself.
    pub fn id(&self) -> &RuntimeId {
        &self.id
    }

    /// Returns the identity of the immediately enclosing test, if this is a subtest.
    pub fn parent(&self) -> Option<&RuntimeId> {
        self.ancestors.first()
    }

    /// Returns the identities of all enclosing tests, nearest first.
    pub fn ancestors(&self) -> &[RuntimeId] {
        &self.ancestors
    }
}

/// Transforms a test or subtest display name the way `go test` reports it: one layer of
/// surrounding quotes is stripped, and whitespace becomes `_`.
pub fn transform_test_name(name: &str) -> String {
    strip_quotes(name)
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn strip_quotes(name: &str) -> &str {
    ['"', '`', '\'']
        .into_iter()
        .find_map(|quote| name.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(name)
}

/// Builds a static identity from a source path and the chain of enclosing names.
///
/// This is the discoverer's half of the identity contract; names are transformed with
/// [`transform_test_name`].
pub fn static_id<'a>(path: &Utf8Path, names: impl IntoIterator<Item = &'a str>) -> String {
    let mut id = path.as_str().to_owned();
    for name in names {
        id.push_str(ID_SEPARATOR);
        id.push_str(&transform_test_name(name));
    }
    id
}

/// Maps a static identity onto the runtime identity scheme.
///
/// Returns `None` if the static identity's path is not under the module root. A returned
/// identity is only a candidate: directories and files map to bare package paths, which never
/// appear in the event stream.
pub fn static_to_runtime(static_id: &str, module: &GoModule) -> Option<RuntimeId> {
    let (path, names) = match static_id.split_once(ID_SEPARATOR) {
        Some((path, names)) => (path, Some(names)),
        None => (static_id, None),
    };

    let path = normalize_separators(path);
    let root = normalize_separators(module.root().as_str());
    let relative = path.strip_prefix(root.trim_end_matches('/'))?;
    if !relative.is_empty() && !relative.starts_with('/') {
        // A sibling directory sharing a prefix with the root, e.g. `/proj-other` vs `/proj`.
        return None;
    }
    let relative = TEST_FILE_SUFFIX.replace(relative, "");

    let mut id = format!("{}{relative}", module.module_path());
    if let Some(names) = names {
        id.push_str(ID_SEPARATOR);
        id.push_str(names);
    }
    Some(RuntimeId(id))
}

/// Recovers the test file name (for example `foo_test.go`) from a static identity.
pub fn test_file_name(static_id: &str) -> Option<&str> {
    let path = static_id
        .split_once(ID_SEPARATOR)
        .map_or(static_id, |(path, _)| path);
    TEST_FILE_NAME
        .captures(path)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn normalize_separators(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}
