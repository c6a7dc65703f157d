// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ConfigExperimental, ExperimentalConfig};
use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    invocation::InvocationConfig,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Trait for handling configuration warnings.
///
/// The default implementation, [`DefaultConfigWarnings`], logs them.
pub trait ConfigWarnings {
    /// Handles unknown configuration keys found in a config file.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        project_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Logs configuration warnings using `tracing`.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        project_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        if let [single] = unknown.iter().collect::<Vec<_>>().as_slice() {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.push_str(single);
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file.strip_prefix(project_root).unwrap_or(config_file),
        );
    }
}

/// Repository configuration for gotest-bridge.
///
/// Read from `.config/gotest-bridge.toml` under the project root, layered over the defaults in
/// [`BridgeConfig::DEFAULT_CONFIG`].
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    project_root: Utf8PathBuf,
    inner: BridgeConfigDeserialize,
    experimental: BTreeSet<ConfigExperimental>,
}

impl BridgeConfig {
    /// The default location of the config file, relative to the project root.
    pub const CONFIG_PATH: &'static str = ".config/gotest-bridge.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from the given file, or from [`Self::CONFIG_PATH`] under the project root
    /// if `config_file` is `None`. A missing file at the default location is not an error.
    ///
    /// `experimental` is merged with the features enabled in the file; it typically comes from
    /// [`ConfigExperimental::from_env`] and the command line.
    pub fn from_sources(
        project_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        experimental: &BTreeSet<ConfigExperimental>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(
            project_root,
            config_file,
            experimental,
            &mut DefaultConfigWarnings,
        )
    }

    /// Like [`Self::from_sources`], reporting warnings to `warnings`.
    pub fn from_sources_with_warnings(
        project_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        experimental: &BTreeSet<ConfigExperimental>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let project_root = project_root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = project_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (inner, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &project_root, &unknown);
        }

        let mut experimental = experimental.clone();
        experimental.extend(inner.experimental.to_set());

        Ok(Self {
            project_root,
            inner,
            experimental,
        })
    }

    /// Returns the default config, with only the given experimental features enabled.
    pub fn default_config(
        project_root: impl Into<Utf8PathBuf>,
        experimental: &BTreeSet<ConfigExperimental>,
    ) -> Self {
        let (inner, _) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        let mut experimental = experimental.clone();
        experimental.extend(inner.experimental.to_set());
        Self {
            project_root: project_root.into(),
            inner,
            experimental,
        }
    }

    /// Returns the project root.
    pub fn project_root(&self) -> &Utf8Path {
        &self.project_root
    }

    /// Returns the enabled experimental features.
    pub fn experimental(&self) -> &BTreeSet<ConfigExperimental> {
        &self.experimental
    }

    /// Returns the options for building test invocations.
    pub fn invocation_config(&self) -> InvocationConfig {
        InvocationConfig {
            test_table_support: self.experimental.contains(&ConfigExperimental::TestTable),
            extra_args: self.inner.invocation.extra_args.clone(),
        }
    }

    /// Returns the directory output is persisted to, if configured.
    pub fn store_dir(&self) -> Option<Utf8PathBuf> {
        self.inner
            .output
            .store_dir
            .as_deref()
            .map(|dir| self.project_root.join(dir))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(BridgeConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: BridgeConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // The config crate also reports the key; drop it so that it isn't printed twice.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

// The config crate drops empty tables and arrays, so every field has a default.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BridgeConfigDeserialize {
    #[serde(default)]
    invocation: InvocationConfigDeserialize,
    #[serde(default)]
    output: OutputConfigDeserialize,
    #[serde(default)]
    experimental: ExperimentalConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct InvocationConfigDeserialize {
    #[serde(default)]
    extra_args: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct OutputConfigDeserialize {
    #[serde(default)]
    store_dir: Option<Utf8PathBuf>,
}
