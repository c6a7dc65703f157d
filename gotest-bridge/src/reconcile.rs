// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of aggregated runtime state with the position tree.

use crate::{
    aggregator::{AggregatedRun, AggregatedTest},
    errors::ReconcileError,
    identity::{static_to_runtime, test_file_name},
    module::GoModule,
    output_store::OutputStore,
};
use gotest_bridge_metadata::{
    Position, PositionTree, ReconciledResult, ResultError, RunResults, RunResultsKind, TestStatus,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Produces per-position results for a run.
///
/// If the run tracked no tests (including the case where the stream could not be decoded), every
/// position is reported failed and shares a single persisted copy of the run log. Otherwise the
/// Go module is discovered from the tree's root path and each position is matched by identity.
pub fn reconcile(
    tree: &PositionTree,
    run: &AggregatedRun,
    store: &mut dyn OutputStore,
) -> Result<RunResults, ReconcileError> {
    if run.is_empty() {
        return universal_failure(tree, run, store);
    }
    let module = GoModule::discover(&tree.root().path)?;
    reconcile_with_module(tree, run, &module, store)
}

/// Like [`reconcile`], with an already-known Go module.
pub fn reconcile_with_module(
    tree: &PositionTree,
    run: &AggregatedRun,
    module: &GoModule,
    store: &mut dyn OutputStore,
) -> Result<RunResults, ReconcileError> {
    if run.is_empty() {
        return universal_failure(tree, run, store);
    }

    let mut results = BTreeMap::new();
    for item in tree.iter() {
        let position = item.position;
        let Some(test) = static_to_runtime(&position.id, module)
            .and_then(|runtime| run.get(runtime.as_str()))
        else {
            trace!("no runtime counterpart for position `{}`", position.id);
            continue;
        };
        let result = matched_result(position, test, store)?;
        results.insert(position.id.clone(), result);
    }

    debug!(
        "reconciled {} of {} positions against {} tracked tests",
        results.len(),
        tree.len(),
        run.tests().len(),
    );
    Ok(RunResults {
        kind: RunResultsKind::Reconciled,
        results,
    })
}

fn matched_result(
    position: &Position,
    test: &AggregatedTest,
    store: &mut dyn OutputStore,
) -> Result<ReconciledResult, ReconcileError> {
    // A test with no terminal status was cut short, typically by a crash or a timeout.
    let status = test.status.unwrap_or(TestStatus::Failed);
    let errors = test_file_name(&position.id)
        .and_then(|file| test.file_output.get(file))
        .map(|lines| {
            lines
                .iter()
                .map(|(&line, fragments)| ResultError {
                    line,
                    message: fragments.join("\n"),
                })
                .collect()
        });

    Ok(ReconciledResult {
        status,
        output: store.persist(&position.id, &test.output)?,
        short: Some(test.output.join("\n")),
        errors,
    })
}

fn universal_failure(
    tree: &PositionTree,
    run: &AggregatedRun,
    store: &mut dyn OutputStore,
) -> Result<RunResults, ReconcileError> {
    let kind = if run.fallback().is_some() {
        RunResultsKind::StreamFallback
    } else {
        RunResultsKind::NoTestsTracked
    };
    debug!("no tests tracked ({kind:?}), failing all {} positions", tree.len());

    let output = store.persist(&tree.root().id, run.log())?;
    let results = tree
        .iter()
        .map(|item| {
            let result = ReconciledResult {
                status: TestStatus::Failed,
                output: output.clone(),
                short: None,
                errors: None,
            };
            (item.position.id.clone(), result)
        })
        .collect();
    Ok(RunResults { kind, results })
}
