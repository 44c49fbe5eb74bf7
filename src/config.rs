// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `ACTGRAPH_BASE_URL`
pub const ENV_PREFIX: &str = "ACTGRAPH";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page URL prefix; seed references are this plus the session key
    pub base_url: String,
    /// Directory for persisted snapshots
    pub data_dir: PathBuf,
    /// Transport timeout for one page fetch
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Row labels that mark the associations row of an infobox
    pub association_labels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org/wiki/".to_string(),
            data_dir: directories::ProjectDirs::from("org", "hyperpolymath", "actgraph")
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".actgraph")),
            timeout_secs: 30,
            user_agent: format!(
                "actgraph/{} (+https://github.com/hyperpolymath/actgraph)",
                env!("CARGO_PKG_VERSION")
            ),
            association_labels: vec!["Associated acts".to_string()],
        }
    }
}

/// Default location of the config file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "actgraph")
        .map(|d| d.config_dir().join("config.toml"))
}

/// `ACTGRAPH_*` overrides; list settings are comma separated
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("association_labels")
}

/// Load configuration: defaults, then the TOML file, then environment.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    load_with(path, environment())
}

fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Config> {
    let defaults = config::Config::try_from(&Config::default())
        .context("Failed to build default configuration")?;

    let mut builder = config::Config::builder().add_source(defaults);
    match path {
        Some(path) => {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        None => {
            if let Some(path) = default_path() {
                builder = builder.add_source(
                    config::File::from(path)
                        .format(config::FileFormat::Toml)
                        .required(false),
                );
            }
        }
    }

    builder
        .add_source(env)
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}
