// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use gotest_bridge::{
    aggregator::{AggregatedRun, aggregate},
    styles::OutputStyles,
};
use gotest_bridge_metadata::{Position, PositionKind, PositionNode, PositionTree};
use indoc::indoc;
use std::fs;

pub(crate) const TEST_FILE: &str = indoc! {r#"
    //go:build unit

    package calc

    import "testing"

    func TestAdd(t *testing.T) {}

    func TestTable(t *testing.T) {
        for _, tc := range []struct{ name string }{
            {"positive numbers"},
            {"negative numbers"},
        } {
            t.Run(tc.name, func(t *testing.T) { t.Errorf("got 3, want 4") })
        }
    }
"#};

pub(crate) const EVENTS: &str = indoc! {r#"
    {"Action":"start","Package":"example.com/calc"}
    {"Action":"run","Package":"example.com/calc","Test":"TestAdd"}
    {"Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"=== RUN   TestAdd\n"}
    {"Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"--- PASS: TestAdd (0.00s)\n"}
    {"Action":"pass","Package":"example.com/calc","Test":"TestAdd","Elapsed":0}
    {"Action":"run","Package":"example.com/calc","Test":"TestTable"}
    {"Action":"run","Package":"example.com/calc","Test":"TestTable/positive_numbers"}
    {"Action":"run","Package":"example.com/calc","Test":"TestTable/negative_numbers"}

    {"Action":"output","Package":"example.com/calc","Test":"TestTable/negative_numbers","Output":"    calc_test.go:14: got 3, want 4\n"}
    {"Action":"pass","Package":"example.com/calc","Test":"TestTable/positive_numbers","Elapsed":0}
    {"Action":"fail","Package":"example.com/calc","Test":"TestTable/negative_numbers","Elapsed":0}
    {"Action":"fail","Package":"example.com/calc","Test":"TestTable","Elapsed":0}
    {"Action":"run","Package":"example.com/calc","Test":"TestSkipped"}
    {"Action":"skip","Package":"example.com/calc","Test":"TestSkipped","Elapsed":0}
    {"Action":"run","Package":"example.com/calc","Test":"TestHung"}
    {"Action":"output","Package":"example.com/calc","Test":"TestHung","Output":"=== RUN   TestHung\n"}
    {"Action":"output","Package":"example.com/calc","Output":"FAIL\texample.com/calc\t0.01s\n"}
    {"Action":"fail","Package":"example.com/calc","Elapsed":0.01}
"#};

/// A Go module in a temporary directory with a single test file at its root.
pub(crate) struct GoProject {
    dir: Utf8TempDir,
}

impl GoProject {
    pub(crate) fn new() -> Self {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        fs::write(dir.path().join("go.mod"), "module example.com/calc\n\ngo 1.22\n")
            .expect("wrote go.mod");
        fs::write(dir.path().join("calc_test.go"), TEST_FILE).expect("wrote test file");
        Self { dir }
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    pub(crate) fn file(&self) -> Utf8PathBuf {
        self.root().join("calc_test.go")
    }

    /// Returns the static identity of a test in the test file.
    pub(crate) fn id(&self, names: &str) -> String {
        format!("{}::{names}", self.file())
    }

    pub(crate) fn write_config(&self, contents: &str) {
        let dir = self.root().join(".config");
        fs::create_dir_all(&dir).expect("created config dir");
        fs::write(dir.join("gotest-bridge.toml"), contents).expect("wrote config");
    }

    pub(crate) fn tree(&self) -> PositionTree {
        let file = self.file();
        let test = |names: &str, name: &str| {
            PositionNode::new(Position {
                id: self.id(names),
                kind: PositionKind::Test,
                path: file.clone(),
                name: name.to_owned(),
                range: None,
            })
        };

        let file_node = PositionNode::new(Position {
            id: file.to_string(),
            kind: PositionKind::File,
            path: file.clone(),
            name: "calc_test.go".to_owned(),
            range: None,
        })
        .with_children([
            test("TestAdd", "TestAdd"),
            test("TestTable", "TestTable").with_children([
                test("TestTable::positive_numbers", "\"positive numbers\""),
                test("TestTable::negative_numbers", "\"negative numbers\""),
            ]),
            test("TestSkipped", "TestSkipped"),
            test("TestHung", "TestHung"),
            test("TestNeverRan", "TestNeverRan"),
        ]);

        PositionTree::new(
            PositionNode::new(Position {
                id: self.root().to_string(),
                kind: PositionKind::Dir,
                path: self.root().to_owned(),
                name: "calc".to_owned(),
                range: None,
            })
            .with_children([file_node]),
        )
    }

    pub(crate) fn aggregate(&self, stream: &str) -> AggregatedRun {
        aggregate(stream.lines(), &OutputStyles::default())
    }
}
