// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations.

use super::common::{ConfigOpts, InputOpts, TreeOpts, project_root};
use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputWriter},
};
use clap::{Args, ValueEnum};
use gotest_bridge::{
    invocation::InvocationBuilder,
    output_store::DirOutputStore,
    reconcile::reconcile,
};
use gotest_bridge_metadata::{GotestBridgeExitCode, RunResults, RunResultsKind};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

#[derive(Debug, Args)]
pub(crate) struct ArgsOpts {
    #[clap(flatten)]
    tree: TreeOpts,

    /// ID of the position to build the invocation for
    #[arg(long, value_name = "ID")]
    position: String,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: ArgsFormat,

    /// Extra arguments passed to `go test`, after those from the config file
    #[arg(last = true)]
    extra_args: Vec<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ArgsFormat {
    /// A command line quoted for a POSIX shell, prefixed with a `cd` to the working directory
    #[default]
    Shell,
    /// A JSON object with the working directory, scope and arguments
    Json,
}

impl ArgsOpts {
    pub(crate) fn exec(
        self,
        config_opts: &ConfigOpts,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let tree = self.tree.read_tree()?;
        let config = config_opts.make_config(&project_root(&tree))?;
        let invocation_config = config.invocation_config();

        let invocation = InvocationBuilder::new(&invocation_config)
            .extra_args(self.extra_args)
            .build(&tree, &self.position)?;
        debug!("built invocation for `{}`: {invocation}", self.position);

        let mut writer = output_writer.stdout_writer();
        match self.format {
            ArgsFormat::Shell => {
                writeln!(writer, "{invocation}")
                    .map_err(|error| ExpectedError::WriteOutputError { error })?;
                flush(&mut writer)?;
            }
            ArgsFormat::Json => write_json(&mut writer, &invocation)?,
        }

        Ok(GotestBridgeExitCode::OK)
    }
}

#[derive(Debug, Args)]
pub(crate) struct AggregateOpts {
    #[clap(flatten)]
    input: InputOpts,
}

impl AggregateOpts {
    pub(crate) fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let run = self.input.aggregate(output.output_styles())?;
        write_json(&mut output_writer.stdout_writer(), &run)?;

        match run.fallback() {
            Some(fallback) => {
                debug!(
                    "stream treated as a raw log from line {}: {}",
                    fallback.line_number, fallback.message
                );
                Ok(GotestBridgeExitCode::STREAM_FALLBACK)
            }
            None => Ok(GotestBridgeExitCode::OK),
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ResultsOpts {
    #[clap(flatten)]
    tree: TreeOpts,

    #[clap(flatten)]
    input: InputOpts,
}

impl ResultsOpts {
    pub(crate) fn exec(
        self,
        config_opts: &ConfigOpts,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let tree = self.tree.read_tree()?;
        let config = config_opts.make_config(&project_root(&tree))?;

        let run = self.input.aggregate(output.output_styles())?;
        let mut store = match config.store_dir() {
            Some(dir) => DirOutputStore::new(dir)?,
            None => DirOutputStore::in_temp_dir()?,
        };
        debug!("persisting output to {}", store.dir());

        let results = reconcile(&tree, &run, &mut store)?;
        write_json(&mut output_writer.stdout_writer(), &results)?;

        Ok(results_exit_code(&results))
    }
}

fn results_exit_code(results: &RunResults) -> i32 {
    match results.kind {
        RunResultsKind::StreamFallback => GotestBridgeExitCode::STREAM_FALLBACK,
        // Every position is failed when no tests were tracked.
        RunResultsKind::NoTestsTracked => GotestBridgeExitCode::TEST_RUN_FAILED,
        RunResultsKind::Reconciled if results.has_failures() => {
            GotestBridgeExitCode::TEST_RUN_FAILED
        }
        RunResultsKind::Reconciled => GotestBridgeExitCode::OK,
    }
}

fn write_json(writer: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)
        .map_err(|error| ExpectedError::SerializeError { error })?;
    writeln!(writer).map_err(|error| ExpectedError::WriteOutputError { error })?;
    flush(writer)
}

fn flush(writer: &mut impl Write) -> Result<()> {
    writer
        .flush()
        .map_err(|error| ExpectedError::WriteOutputError { error })
}
