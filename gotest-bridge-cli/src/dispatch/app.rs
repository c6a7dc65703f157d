// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::{
    commands::{AggregateOpts, ArgsOpts, ResultsOpts},
    common::ConfigOpts,
};
use crate::{
    Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use clap::{Parser, Subcommand};

/// Connects `go test -json` output to editor test trees.
///
/// gotest-bridge builds `go test` invocations for positions discovered by an editor, and turns the
/// resulting event stream into per-position results.
#[derive(Debug, Parser)]
#[command(
    name = "gotest-bridge",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct GotestBridgeApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(subcommand)]
    command: Command,
}

impl GotestBridgeApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Args(opts) => opts.exec(&self.config_opts, output_writer),
            Command::Aggregate(opts) => opts.exec(output, output_writer),
            Command::Results(opts) => opts.exec(&self.config_opts, output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the `go test` invocation for a position
    Args(ArgsOpts),
    /// Aggregate a `go test -json` stream into per-test state
    ///
    /// Prints the aggregated tests as JSON. Exits with a distinct code if the stream could not be
    /// decoded.
    Aggregate(AggregateOpts),
    /// Reconcile a `go test -json` stream against a position tree
    ///
    /// Output for each matched position is persisted to the output directory, and the results
    /// are printed as JSON keyed by position ID.
    Results(ResultsOpts),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn valid_command_lines() {
        let valid = [
            "gotest-bridge args --tree tree.json --position /p/a_test.go::TestA",
            "gotest-bridge args --tree tree.json --position /p --format json",
            "gotest-bridge args --tree tree.json --position /p -- -count=1 -race",
            "gotest-bridge --experimental test-table args --tree t.json --position /p",
            "gotest-bridge aggregate",
            "gotest-bridge aggregate --input events.jsonl --color never",
            "gotest-bridge results --tree tree.json",
            "gotest-bridge results --tree tree.json --input events.jsonl --config-file c.toml",
            "gotest-bridge -v results --tree tree.json",
        ];

        for args in valid {
            let cmd = shell_words::split(args).expect("valid command line");
            if let Err(error) = GotestBridgeApp::try_parse_from(cmd) {
                panic!("{args} should have successfully parsed, but didn't: {error}");
            }
        }
    }

    #[test]
    fn invalid_command_lines() {
        let invalid = [
            ("gotest-bridge args --position /p", ErrorKind::MissingRequiredArgument),
            ("gotest-bridge results", ErrorKind::MissingRequiredArgument),
            (
                "gotest-bridge args --tree t.json --position /p --format yaml",
                ErrorKind::InvalidValue,
            ),
            (
                "gotest-bridge --experimental bogus aggregate",
                ErrorKind::ValueValidation,
            ),
            ("gotest-bridge --verbose", ErrorKind::MissingSubcommand),
        ];

        for (args, kind) in invalid {
            let cmd = shell_words::split(args).expect("valid command line");
            match GotestBridgeApp::try_parse_from(cmd) {
                Ok(_) => panic!("{args} should have errored out but successfully parsed"),
                Err(error) => assert_eq!(error.kind(), kind, "for {args}: {error}"),
            }
        }
    }
}
