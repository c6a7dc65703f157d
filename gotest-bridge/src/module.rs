// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of the Go module a project belongs to.

use crate::errors::ModuleError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{fs, sync::LazyLock};
use tracing::debug;

/// The name of the Go module manifest.
pub const GO_MOD_FILE_NAME: &str = "go.mod";

static MODULE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*module\s+(\S.*)$").expect("regex is valid"));

/// A Go module: the directory containing `go.mod`, and the module path it declares.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoModule {
    root: Utf8PathBuf,
    module_path: String,
}

impl GoModule {
    /// Creates a module from a known root and module path.
    pub fn new(root: impl Into<Utf8PathBuf>, module_path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            module_path: module_path.into(),
        }
    }

    /// Finds the nearest `go.mod` at or above `start` and reads its module path.
    ///
    /// `start` may be a file or a directory.
    pub fn discover(start: &Utf8Path) -> Result<Self, ModuleError> {
        let manifest = find_manifest(start).ok_or_else(|| ModuleError::NotFound {
            start: start.to_owned(),
        })?;
        Self::from_manifest(&manifest)
    }

    /// Reads the module path from the given `go.mod` file.
    pub fn from_manifest(manifest: &Utf8Path) -> Result<Self, ModuleError> {
        let contents = fs::read_to_string(manifest).map_err(|error| ModuleError::Read {
            path: manifest.to_owned(),
            error,
        })?;
        let module_path =
            parse_module_path(&contents).ok_or_else(|| ModuleError::NoModuleDirective {
                path: manifest.to_owned(),
            })?;
        let root = manifest.parent().unwrap_or(Utf8Path::new("")).to_owned();

        debug!("found module `{module_path}` rooted at {root}");
        Ok(Self { root, module_path })
    }

    /// Returns the directory containing `go.mod`.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the declared module path, e.g. `example.com/proj`.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }
}

fn find_manifest(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let start_dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    start_dir
        .ancestors()
        .map(|dir| dir.join(GO_MOD_FILE_NAME))
        .find(|manifest| manifest.is_file())
}

/// Returns the module path from the first `module` directive in `contents`.
fn parse_module_path(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let captures = MODULE_DIRECTIVE.captures(line)?;
        let value = captures.get(1)?.as_str();
        let value = value.split_once("//").map_or(value, |(value, _)| value).trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        (!value.is_empty()).then(|| value.to_owned())
    })
}
