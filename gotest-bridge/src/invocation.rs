// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building the `go test` invocation for a selected position.
//!
//! The scope depends on the position's kind:
//!
//! * `dir` and `file` positions run every package under the directory (`./...`). A single file
//!   cannot always be compiled on its own, so file runs are widened to the directory.
//! * `namespace` positions run the package declared on the first line of the file.
//! * `test` positions are name-filtered with `-run`, using the immediate parent name and the
//!   test name, anchored at the end so that siblings sharing a prefix are not included.
//!
//! Build constraints on the first line of the file become a `-tags` flag.

use crate::{errors::InvocationBuildError, identity::transform_test_name, source::SourceHeader};
use camino::{Utf8Path, Utf8PathBuf};
use gotest_bridge_metadata::{Position, PositionKind, PositionRef, PositionTree};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// The program invoked to run tests.
pub const GO_PROGRAM: &str = "go";

/// Options that affect how invocations are built.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InvocationConfig {
    /// Whether table-driven test cases (a `test` position nested directly under another `test`
    /// position) can be selected individually. If false, selecting a case runs its parent test.
    pub test_table_support: bool,

    /// Arguments appended after the built-in flags.
    pub extra_args: Vec<String>,
}

/// The subset of tests an invocation selects.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TestScope {
    /// Every package under the working directory.
    Recursive,

    /// The package in the working directory.
    ///
    /// Always rendered as `.`. The package name is carried for display and JSON output only.
    Package {
        /// The package name declared on line 1 of the file.
        name: String,
    },

    /// Tests in the package in the working directory whose names match a `-run` pattern.
    Run {
        /// The pattern.
        pattern: String,
    },
}

impl TestScope {
    fn push_args(&self, args: &mut Vec<String>) {
        match self {
            Self::Recursive => args.push("./...".to_owned()),
            Self::Package { .. } => args.push(".".to_owned()),
            Self::Run { pattern } => {
                args.push("-run".to_owned());
                args.push(pattern.clone());
            }
        }
    }
}

/// A fully built `go test` invocation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TestInvocation {
    cwd: Utf8PathBuf,
    scope: TestScope,
    args: Vec<String>,
}

impl TestInvocation {
    /// Returns the directory to run `go` in.
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Returns the selected scope.
    pub fn scope(&self) -> &TestScope {
        &self.scope
    }

    /// Returns the arguments to pass to `go`, starting with `test`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the command line, quoted for a POSIX shell.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(GO_PROGRAM).chain(self.args.iter().map(String::as_str)))
    }
}

impl fmt::Display for TestInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cd {} && {}",
            shell_words::quote(self.cwd.as_str()),
            self.command_line()
        )
    }
}

/// Builds [`TestInvocation`]s for positions.
#[derive(Clone, Debug)]
pub struct InvocationBuilder<'cfg> {
    config: &'cfg InvocationConfig,
    extra_args: Vec<String>,
}

impl<'cfg> InvocationBuilder<'cfg> {
    /// Creates a new builder.
    pub fn new(config: &'cfg InvocationConfig) -> Self {
        Self {
            config,
            extra_args: Vec::new(),
        }
    }

    /// Adds arguments to be appended after those from the config.
    pub fn extra_args(&mut self, args: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds the invocation for the position with the given ID.
    pub fn build(
        &self,
        tree: &PositionTree,
        id: &str,
    ) -> Result<TestInvocation, InvocationBuildError> {
        let item = tree
            .find(id)
            .ok_or_else(|| InvocationBuildError::PositionNotFound { id: id.to_owned() })?;
        self.build_for(item)
    }

    /// Builds the invocation for a position yielded by [`PositionTree::iter`].
    pub fn build_for(&self, item: PositionRef<'_>) -> Result<TestInvocation, InvocationBuildError> {
        let position = item.position;

        let (cwd, header) = match position.kind {
            PositionKind::Dir => (position.path.clone(), None),
            PositionKind::File | PositionKind::Namespace | PositionKind::Test => {
                let header = SourceHeader::read(&position.path).map_err(|error| {
                    InvocationBuildError::SourceFile {
                        id: position.id.clone(),
                        error,
                    }
                })?;
                (parent_dir(&position.path)?, Some(header))
            }
        };

        let scope = match position.kind {
            PositionKind::Dir | PositionKind::File => TestScope::Recursive,
            PositionKind::Namespace => {
                let name = header
                    .as_ref()
                    .and_then(SourceHeader::package_name)
                    .ok_or_else(|| InvocationBuildError::PackageNotDeclared {
                        path: position.path.clone(),
                    })?;
                TestScope::Package {
                    name: name.to_owned(),
                }
            }
            PositionKind::Test => TestScope::Run {
                pattern: self.run_pattern(position, item.parent),
            },
        };

        let mut args = vec!["test".to_owned(), "-v".to_owned(), "-json".to_owned()];
        if let Some(tags) = header.as_ref().and_then(SourceHeader::tags_flag) {
            args.push(tags);
        }
        scope.push_args(&mut args);
        args.extend(self.config.extra_args.iter().cloned());
        args.extend(self.extra_args.iter().cloned());

        debug!("built invocation for `{}`: {args:?} in {cwd}", position.id);
        Ok(TestInvocation { cwd, scope, args })
    }

    fn run_pattern(&self, position: &Position, parent: Option<&Position>) -> String {
        let name = transform_test_name(&position.name);
        match parent.filter(|parent| parent.kind == PositionKind::Test) {
            Some(parent) if self.config.test_table_support => {
                format!("{}/{name}$", transform_test_name(&parent.name))
            }
            Some(parent) => {
                debug!(
                    "table test support is disabled, running `{}` instead of case `{name}`",
                    parent.name
                );
                format!("{}$", transform_test_name(&parent.name))
            }
            None => format!("{name}$"),
        }
    }
}

fn parent_dir(path: &Utf8Path) -> Result<Utf8PathBuf, InvocationBuildError> {
    match path.parent() {
        Some(parent) if parent.as_str().is_empty() => Ok(Utf8PathBuf::from(".")),
        Some(parent) => Ok(parent.to_owned()),
        None => Err(InvocationBuildError::NoParentDir {
            path: path.to_owned(),
        }),
    }
}
