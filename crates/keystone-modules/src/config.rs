// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.
//!
//! Values are layered: built-in defaults, then the user file
//! (`<config dir>/keystone/config.toml`), then `./keystone.toml`, then
//! `KEYSTONE_CONFIG_*` environment variables.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{ModuleError, Result};
use crate::resolver::{ProbeConfig, DEFAULT_ENTRY_FILE, DEFAULT_EXTENSION};

/// Environment variable listing extra module directories
pub const DEFAULT_PATH_ENV: &str = "KEYSTONE_PATH";

/// Prefix for configuration overrides in the environment
pub const CONFIG_ENV_PREFIX: &str = "KEYSTONE_CONFIG_";

/// Project-local configuration file name
pub const PROJECT_CONFIG_FILE: &str = "keystone.toml";

/// Configuration for module loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Extensions appended when probing (without the dot)
    pub extensions: Vec<String>,

    /// Entry file names probed inside directories
    pub entry_files: Vec<String>,

    /// Environment variable holding extra module directories
    pub path_env: String,

    /// Override for the installation modules directory
    pub install_dir: Option<PathBuf>,

    /// Whether the user configuration modules directory is searched
    pub user_modules: bool,

    /// Extra directories searched after the environment entries
    pub search_paths: Vec<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            entry_files: vec![DEFAULT_ENTRY_FILE.to_string()],
            path_env: DEFAULT_PATH_ENV.to_string(),
            install_dir: None,
            user_modules: true,
            search_paths: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from default locations.
    pub fn load() -> Result<Self> {
        let mut config = LoaderConfig::default();

        // Load from user config file
        if let Some(user_config_path) = user_config_path() {
            if user_config_path.is_file() {
                config = config.merged_with_file(&user_config_path)?;
            }
        }

        // Load from project config file
        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.is_file() {
            config = config.merged_with_file(&project_config)?;
        }

        // Load from environment variables
        config.load_from_env(utf8_vars(std::env::vars_os()))?;

        Ok(config)
    }

    /// Parse a configuration file on its own.
    pub fn from_file(path: &Path) -> Result<Self> {
        LoaderConfig::default().merged_with_file(path)
    }

    /// Overlay the keys present in `path` onto this configuration.
    fn merged_with_file(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overlay: toml::Table = toml::from_str(&content)?;
        debug!("Merging loader configuration from {}", path.display());

        let mut merged = toml::Table::try_from(&self)
            .map_err(|e| ModuleError::Config(e.to_string()))?;
        merged.extend(overlay);
        Ok(merged.try_into()?)
    }

    /// Apply `KEYSTONE_CONFIG_*` variables from `vars`.
    pub fn load_from_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) -> Result<()> {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(CONFIG_ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value from its string form.
    ///
    /// List values are comma separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "extensions" => self.extensions = split_list(value),
            "entry-files" => self.entry_files = split_list(value),
            "path-env" => self.path_env = value.to_string(),
            "install-dir" => self.install_dir = Some(PathBuf::from(value)),
            "user-modules" => {
                self.user_modules = value
                    .parse()
                    .map_err(|_| ModuleError::Config(format!("user-modules expects true or false, got '{}'", value)))?
            }
            "search-paths" => {
                self.search_paths = split_list(value).into_iter().map(PathBuf::from).collect()
            }
            _ => return Err(ModuleError::Config(format!("unknown configuration key '{}'", key))),
        }
        Ok(())
    }

    /// Get a configuration value in its string form.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "extensions" => Some(self.extensions.join(",")),
            "entry-files" => Some(self.entry_files.join(",")),
            "path-env" => Some(self.path_env.clone()),
            "install-dir" => self.install_dir.as_ref().map(|p| p.display().to_string()),
            "user-modules" => Some(self.user_modules.to_string()),
            "search-paths" => Some(
                self.search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }

    /// Probe suffixes derived from this configuration.
    pub fn probes(&self) -> ProbeConfig {
        ProbeConfig {
            extensions: self.extensions.clone(),
            entry_files: self.entry_files.clone(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// The keystone directory under the user's configuration directory.
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("keystone"))
}

/// Get the user config path.
fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join("config.toml"))
}

/// Environment pairs that are valid UTF-8. Other entries are skipped.
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) => {
                warn!("Ignoring environment variable {} with a non-UTF-8 value", key);
                None
            }
            (Err(key), _) => {
                warn!("Ignoring environment variable {:?} with a non-UTF-8 name", key);
                None
            }
        })
}
