// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a Go module on disk, a position tree for it and a recorded event stream,
//! driven through invocation building, aggregation and reconciliation.

mod fixtures;

use camino::Utf8Path;
use fixtures::{EVENTS, GoProject};
use gotest_bridge::{
    aggregator::EventAggregator,
    config::{BridgeConfig, ConfigExperimental},
    invocation::{InvocationBuilder, TestScope},
    output_store::DirOutputStore,
    reconcile::reconcile,
    styles::OutputStyles,
};
use gotest_bridge_metadata::{ResultError, RunResultsKind, TestStatus};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

#[test]
fn reconcile_recorded_run() {
    let project = GoProject::new();
    let tree = project.tree();
    let run = project.aggregate(EVENTS);
    let mut store = DirOutputStore::new(project.root().join("out")).expect("created store");

    let results = reconcile(&tree, &run, &mut store).expect("reconciled");
    assert_eq!(results.kind, RunResultsKind::Reconciled);
    assert!(results.has_failures());

    let add = results.get(&project.id("TestAdd")).expect("TestAdd matched");
    assert_eq!(add.status, TestStatus::Passed);
    assert_eq!(add.errors, None);
    assert_eq!(
        add.short.as_deref(),
        Some("=== RUN   TestAdd\n--- PASS: TestAdd (0.00s)")
    );
    let persisted = std::fs::read_to_string(add.output.as_str()).expect("read persisted output");
    assert_eq!(persisted, "=== RUN   TestAdd\n--- PASS: TestAdd (0.00s)");
    assert!(Utf8Path::new(add.output.as_str()).starts_with(store.dir()));

    let table = results.get(&project.id("TestTable")).expect("TestTable matched");
    assert_eq!(table.status, TestStatus::Failed);
    let short = table.short.as_deref().expect("short output");
    assert!(
        short.contains("calc_test.go:14: got 3"),
        "subtest output fans out to the parent: {short}"
    );

    let case = results
        .get(&project.id("TestTable::negative_numbers"))
        .expect("table case matched");
    assert_eq!(case.status, TestStatus::Failed);
    assert_eq!(
        case.errors.as_deref(),
        Some(
            &[ResultError {
                line: 14,
                message: "got 3, want 4".to_owned(),
            }][..]
        )
    );

    let positive = results
        .get(&project.id("TestTable::positive_numbers"))
        .expect("table case matched");
    assert_eq!(positive.status, TestStatus::Passed);

    let skipped = results.get(&project.id("TestSkipped")).expect("TestSkipped matched");
    assert_eq!(skipped.status, TestStatus::Skipped);

    let hung = results.get(&project.id("TestHung")).expect("TestHung matched");
    assert_eq!(
        hung.status,
        TestStatus::Failed,
        "a test that never finished is reported failed"
    );

    assert!(
        results.get(&project.id("TestNeverRan")).is_none(),
        "positions absent from the stream have no result"
    );
    assert!(results.get(project.root().as_str()).is_none());
    assert!(results.get(project.file().as_str()).is_none());
}

#[test]
fn undecodable_stream_fails_everything() {
    let project = GoProject::new();
    let tree = project.tree();
    let stream = format!("{EVENTS}panic: runtime error\nFAIL\texample.com/calc\t0.01s\n");
    let run = project.aggregate(&stream);
    assert!(run.fallback().is_some());

    let mut store = DirOutputStore::new(project.root().join("out")).expect("created store");
    let results = reconcile(&tree, &run, &mut store).expect("reconciled");
    assert_eq!(results.kind, RunResultsKind::StreamFallback);
    assert_eq!(results.results.len(), tree.len());

    let handles: BTreeSet<_> = results
        .results
        .values()
        .map(|result| {
            assert_eq!(result.status, TestStatus::Failed);
            assert_eq!(result.short, None);
            &result.output
        })
        .collect();
    assert_eq!(handles.len(), 1, "every position shares the raw log");

    let handle = handles.into_iter().next().expect("one handle");
    let log = std::fs::read_to_string(handle.as_str()).expect("read raw log");
    let expected_lines = stream.lines().filter(|line| !line.is_empty()).count();
    assert_eq!(log.lines().count(), expected_lines);
    assert!(log.ends_with("FAIL\texample.com/calc\t0.01s"));
}

#[test]
fn invocations_follow_config() {
    let project = GoProject::new();
    project.write_config(indoc::indoc! {r#"
        [invocation]
        extra-args = ["-count=1"]

        [experimental]
        test-table = true
    "#});
    let tree = project.tree();

    let config = BridgeConfig::from_sources(project.root(), None, &BTreeSet::new())
        .expect("config parsed");
    assert!(config.experimental().contains(&ConfigExperimental::TestTable));
    let invocation_config = config.invocation_config();

    let case = InvocationBuilder::new(&invocation_config)
        .extra_args(["-race"])
        .build(&tree, &project.id("TestTable::negative_numbers"))
        .expect("built invocation");
    assert_eq!(case.cwd(), project.root());
    assert_eq!(
        case.scope(),
        &TestScope::Run {
            pattern: "TestTable/negative_numbers$".to_owned()
        }
    );
    assert_eq!(
        case.args(),
        [
            "test",
            "-v",
            "-json",
            "-tags=unit",
            "-run",
            "TestTable/negative_numbers$",
            "-count=1",
            "-race",
        ]
    );

    let dir = InvocationBuilder::new(&invocation_config)
        .build(&tree, project.root().as_str())
        .expect("built invocation");
    assert_eq!(dir.scope(), &TestScope::Recursive);
    assert_eq!(dir.args(), ["test", "-v", "-json", "./...", "-count=1"]);
}

#[test]
fn streamed_and_materialized_input_agree() {
    let project = GoProject::new();

    let mut aggregator = EventAggregator::new(OutputStyles::default());
    aggregator
        .push_reader(EVENTS.as_bytes())
        .expect("read from memory");
    let streamed = aggregator.finish();
    let materialized = project.aggregate(EVENTS);

    assert_eq!(streamed.tests(), materialized.tests());
    assert_eq!(streamed.log(), materialized.log());
}
