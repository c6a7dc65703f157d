// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a discovered position.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionKind {
    /// A directory, possibly containing several packages.
    Dir,

    /// A single `_test.go` file.
    File,

    /// A test function that contains subtests.
    Namespace,

    /// A test function or a subtest.
    Test,
}

impl PositionKind {
    /// Returns the name of this kind as used in the serialized tree.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dir => "dir",
            Self::File => "file",
            Self::Namespace => "namespace",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for PositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single position discovered in source.
///
/// The `id` is the static identity assigned by the discoverer: the filesystem
/// path followed by `::`-separated namespace and test names.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// The globally unique static identity of this position.
    pub id: String,

    /// The kind of position.
    #[serde(rename = "type")]
    pub kind: PositionKind,

    /// The filesystem path: a directory for [`PositionKind::Dir`], a file otherwise.
    pub path: Utf8PathBuf,

    /// The display name.
    pub name: String,

    /// The source range as `[start_line, start_col, end_line, end_col]`, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[u32; 4]>,
}

/// A node in a [`PositionTree`]: a position along with the positions it contains.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PositionNode {
    /// The position at this node.
    #[serde(flatten)]
    pub position: Position,

    /// Contained positions, in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PositionNode>,
}

impl PositionNode {
    /// Creates a new leaf node.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            children: Vec::new(),
        }
    }

    /// Adds the given children to this node.
    pub fn with_children(mut self, children: impl IntoIterator<Item = PositionNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// The tree of positions discovered for a run, read-only to gotest-bridge.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionTree {
    root: PositionNode,
}

impl PositionTree {
    /// Creates a new tree from its root node.
    pub fn new(root: PositionNode) -> Self {
        Self { root }
    }

    /// Parses a tree from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the root position.
    pub fn root(&self) -> &Position {
        &self.root.position
    }

    /// Iterates over all positions in pre-order (each parent before its
    /// children, siblings in source order).
    pub fn iter(&self) -> PositionIter<'_> {
        PositionIter {
            stack: vec![(&self.root, None)],
        }
    }

    /// Looks up a position by its ID.
    pub fn find(&self, id: &str) -> Option<PositionRef<'_>> {
        self.iter().find(|item| item.position.id == id)
    }

    /// Returns the number of positions in the tree.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A position yielded by [`PositionTree::iter`], along with its parent.
#[derive(Clone, Copy, Debug)]
pub struct PositionRef<'a> {
    /// The position.
    pub position: &'a Position,

    /// The containing position, or `None` for the root.
    pub parent: Option<&'a Position>,
}

/// Pre-order iterator over a [`PositionTree`].
#[derive(Clone, Debug)]
pub struct PositionIter<'a> {
    stack: Vec<(&'a PositionNode, Option<&'a Position>)>,
}

impl<'a> Iterator for PositionIter<'a> {
    type Item = PositionRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, parent) = self.stack.pop()?;
        // Reversed so that siblings come out in source order.
        self.stack.extend(
            node.children
                .iter()
                .rev()
                .map(|child| (child, Some(&node.position))),
        );
        Some(PositionRef {
            position: &node.position,
            parent,
        })
    }
}
