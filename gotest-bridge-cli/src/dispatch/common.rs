// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options shared between commands.

use crate::{ExpectedError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use gotest_bridge::{
    aggregator::{AggregatedRun, EventAggregator},
    config::{BridgeConfig, ConfigExperimental},
    module::GoModule,
    styles::OutputStyles,
};
use gotest_bridge_metadata::{PositionKind, PositionTree};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, BufReader},
};
use tracing::debug;

/// Configuration options.
#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
pub(crate) struct ConfigOpts {
    /// Config file [default: project-root/.config/gotest-bridge.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config_file: Option<Utf8PathBuf>,

    /// Enable an experimental feature (may be specified multiple times)
    ///
    /// Features can also be enabled through environment variables of the form
    /// GOTEST_BRIDGE_EXPERIMENTAL_<FEATURE>=1, or in the config file.
    #[arg(long, global = true, value_name = "FEATURE")]
    pub(crate) experimental: Vec<ConfigExperimental>,
}

impl ConfigOpts {
    /// Creates a config rooted at `project_root`.
    pub(crate) fn make_config(&self, project_root: &Utf8Path) -> Result<BridgeConfig> {
        let mut experimental: BTreeSet<_> = self.experimental.iter().copied().collect();
        experimental.extend(ConfigExperimental::from_env());

        let config =
            BridgeConfig::from_sources(project_root, self.config_file.as_deref(), &experimental)?;
        Ok(config)
    }
}

/// Options to select the position tree.
#[derive(Debug, Args)]
pub(crate) struct TreeOpts {
    /// Path to the position tree, as JSON
    #[arg(long, value_name = "PATH")]
    pub(crate) tree: Utf8PathBuf,
}

impl TreeOpts {
    pub(crate) fn read_tree(&self) -> Result<PositionTree> {
        let json =
            std::fs::read_to_string(&self.tree).map_err(|error| ExpectedError::TreeReadError {
                path: self.tree.clone(),
                error,
            })?;
        PositionTree::from_json_str(&json).map_err(|error| ExpectedError::TreeParseError {
            path: self.tree.clone(),
            error,
        })
    }
}

/// Options to select the event stream.
#[derive(Debug, Args)]
pub(crate) struct InputOpts {
    /// Read the `go test -json` stream from this file [default: standard input]
    #[arg(long, value_name = "PATH")]
    pub(crate) input: Option<Utf8PathBuf>,
}

impl InputOpts {
    pub(crate) fn aggregate(&self, styles: OutputStyles) -> Result<AggregatedRun> {
        let mut aggregator = EventAggregator::new(styles);
        let res = match &self.input {
            Some(path) => File::open(path)
                .and_then(|file| aggregator.push_reader(BufReader::new(file))),
            None => aggregator.push_reader(io::stdin().lock()),
        };
        res.map_err(|error| ExpectedError::InputReadError {
            path: self.input.clone(),
            error,
        })?;
        Ok(aggregator.finish())
    }
}

/// Returns the root config is read relative to: the Go module root if there is one, otherwise the
/// directory the tree is rooted at.
pub(crate) fn project_root(tree: &PositionTree) -> Utf8PathBuf {
    let root = tree.root();
    match GoModule::discover(&root.path) {
        Ok(module) => module.root().to_owned(),
        Err(error) => {
            debug!("using tree root as project root: {error}");
            match root.kind {
                PositionKind::Dir => root.path.clone(),
                PositionKind::File | PositionKind::Namespace | PositionKind::Test => root
                    .path
                    .parent()
                    .map_or_else(|| root.path.clone(), Utf8Path::to_owned),
            }
        }
    }
}
