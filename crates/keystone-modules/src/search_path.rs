// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Search path assembly
//!
//! Directories are searched in this order:
//! - the installation modules directory
//! - the user configuration modules directory
//! - directories from the path environment variable
//! - directories listed in the configuration file
//!
//! A source that cannot be determined is skipped.

use crate::config::{user_config_dir, LoaderConfig};
use crate::path;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered list of directories probed for file-based modules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Create an empty search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a search path from explicit directories
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Assemble the search path from the running installation, the user's
    /// configuration directory and the environment.
    pub fn from_environment(config: &LoaderConfig) -> Self {
        let install = config.install_dir.clone().or_else(install_modules_dir);
        let user = if config.user_modules {
            user_config_dir().map(|d| d.join("modules"))
        } else {
            None
        };
        let env_value = std::env::var_os(&config.path_env);

        let mut search_path = Self::from_sources(install, user, env_value);
        for dir in &config.search_paths {
            search_path.push(dir.clone());
        }
        debug!("Module search path: {:?}", search_path.dirs);
        search_path
    }

    /// Assemble the search path from already-determined sources.
    ///
    /// `env_value` uses the platform's path-list delimiter (`:` on Unix,
    /// `;` on Windows). Empty entries are ignored.
    pub fn from_sources(
        install: Option<PathBuf>,
        user: Option<PathBuf>,
        env_value: Option<OsString>,
    ) -> Self {
        let mut search_path = Self::new();
        search_path.dirs.extend(install);
        search_path.dirs.extend(user);
        if let Some(value) = env_value {
            search_path.dirs.extend(
                std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()),
            );
        }
        search_path
    }

    /// Append a directory
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// The directories, in priority order
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Iterate over the directories in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    /// Number of directories
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Whether no directory is configured
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Candidate roots for one lookup: `base` (the requesting module's
    /// directory, for relative identifiers) ahead of the whole search path.
    pub fn candidates(&self, base: Option<&Path>) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(self.dirs.len() + 1);
        roots.extend(base.map(Path::to_path_buf));
        roots.extend(self.dirs.iter().cloned());
        roots
    }
}

/// `<exe dir>/../lib/keystone/modules`
fn install_modules_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let bin_dir = exe.parent()?;
    Some(path::normalize(
        &bin_dir.join("..").join("lib").join("keystone").join("modules"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sources_order() {
        let env = std::env::join_paths(["/env/one", "/env/two"]).unwrap();
        let search_path = SearchPath::from_sources(
            Some(PathBuf::from("/install")),
            Some(PathBuf::from("/home/me/.config/keystone/modules")),
            Some(env),
        );
        assert_eq!(
            search_path.dirs(),
            &[
                PathBuf::from("/install"),
                PathBuf::from("/home/me/.config/keystone/modules"),
                PathBuf::from("/env/one"),
                PathBuf::from("/env/two"),
            ]
        );
    }

    #[test]
    fn test_unavailable_sources_are_omitted() {
        let search_path = SearchPath::from_sources(None, None, None);
        assert!(search_path.is_empty());

        let search_path = SearchPath::from_sources(None, Some(PathBuf::from("/user")), Some(OsString::new()));
        assert_eq!(search_path.dirs(), &[PathBuf::from("/user")]);
    }

    #[test]
    fn test_candidates_prepend_base() {
        let search_path = SearchPath::from_dirs(["/a", "/b"]);
        assert_eq!(
            search_path.candidates(Some(Path::new("/mods/pkg"))),
            vec![
                PathBuf::from("/mods/pkg"),
                PathBuf::from("/a"),
                PathBuf::from("/b"),
            ]
        );
        assert_eq!(search_path.candidates(None).len(), 2);
    }

    #[test]
    fn test_from_environment_respects_config() {
        let config = LoaderConfig {
            install_dir: Some(PathBuf::from("/opt/keystone/modules")),
            user_modules: false,
            path_env: "KEYSTONE_TEST_UNSET_PATH_VARIABLE".to_string(),
            search_paths: vec![PathBuf::from("/extra")],
            ..LoaderConfig::default()
        };
        let search_path = SearchPath::from_environment(&config);
        assert_eq!(
            search_path.dirs(),
            &[PathBuf::from("/opt/keystone/modules"), PathBuf::from("/extra")]
        );
    }
}
