// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::UnknownExperimentalError;
use serde::Deserialize;
use std::{collections::BTreeSet, env, fmt, str::FromStr};

/// The `[experimental]` table:
///
/// ```toml
/// [experimental]
/// test-table = true
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ExperimentalConfig {
    #[serde(default)]
    pub(crate) test_table: bool,
}

impl ExperimentalConfig {
    pub(crate) fn to_set(self) -> BTreeSet<ConfigExperimental> {
        let Self { test_table } = self;
        let mut set = BTreeSet::new();
        if test_table {
            set.insert(ConfigExperimental::TestTable);
        }
        set
    }
}

/// Experimental features, enabled in the config file or through environment variables.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ConfigExperimental {
    /// Select individual cases of table-driven tests.
    TestTable,
}

impl ConfigExperimental {
    /// Returns the environment variable that enables this feature.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::TestTable => "GOTEST_BRIDGE_EXPERIMENTAL_TEST_TABLE",
        }
    }

    /// Returns the feature name as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::TestTable => "test-table",
        }
    }

    /// Returns all known experimental features.
    pub fn all() -> &'static [Self] {
        &[Self::TestTable]
    }

    /// Returns the set of features enabled through environment variables.
    ///
    /// A feature is enabled if its variable is set to `1`.
    pub fn from_env() -> BTreeSet<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|feature| env::var(feature.env_var()).as_deref() == Ok("1"))
            .collect()
    }
}

impl fmt::Display for ConfigExperimental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigExperimental {
    type Err = UnknownExperimentalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| UnknownExperimentalError {
                feature: s.to_owned(),
            })
    }
}
