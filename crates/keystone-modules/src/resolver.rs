// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution
//!
//! Each candidate root is probed in a fixed order:
//!
//! 1. the literal joined path
//! 2. the joined path with each configured extension appended
//! 3. the joined path as a directory holding one of the entry files
//!
//! The first root with a hit wins, even if a later root would also match.

use crate::error::{ModuleError, Result};
use crate::fs::FileSystem;
use crate::path;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Default source file extension
pub const DEFAULT_EXTENSION: &str = "ks";

/// Default directory entry file
pub const DEFAULT_ENTRY_FILE: &str = "init.ks";

/// Suffixes tried for every candidate root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Extensions appended to the joined path, in order (without the dot)
    pub extensions: Vec<String>,
    /// File names looked up inside a directory, in order
    pub entry_files: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            entry_files: vec![DEFAULT_ENTRY_FILE.to_string()],
        }
    }
}

/// Module resolver over an ordered list of roots
pub struct ModuleResolver {
    probes: ProbeConfig,
    fs: Arc<dyn FileSystem>,
}

impl ModuleResolver {
    /// Create a resolver with the given probe suffixes
    pub fn new(probes: ProbeConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self { probes, fs }
    }

    /// The probe suffixes in use
    pub fn probes(&self) -> &ProbeConfig {
        &self.probes
    }

    /// Resolve `identifier` against `roots`, returning an absolute,
    /// normalized file path.
    pub fn resolve(&self, identifier: &str, roots: &[PathBuf]) -> Result<PathBuf> {
        for root in self.absolute_roots(roots)? {
            if let Some(found) = self.probe_root(&root, identifier) {
                return Ok(found);
            }
        }

        Err(ModuleError::not_found(identifier))
    }

    /// Every path [`resolve`](Self::resolve) could return for `identifier`,
    /// in probe order, without touching the filesystem beyond the working
    /// directory.
    pub fn candidates(&self, identifier: &str, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();
        for root in self.absolute_roots(roots)? {
            let joined = path::join(&root, identifier);
            candidates.extend(
                self.probes
                    .extensions
                    .iter()
                    .map(|ext| with_appended_extension(&joined, ext)),
            );
            candidates.extend(self.probes.entry_files.iter().map(|entry| joined.join(entry)));
            candidates.push(joined);
        }
        Ok(candidates)
    }

    fn absolute_roots(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut cwd: Option<PathBuf> = None;
        let mut absolute = Vec::with_capacity(roots.len());

        for root in roots {
            if root.is_absolute() {
                absolute.push(path::normalize(root));
                continue;
            }
            if cwd.is_none() {
                cwd = Some(self.fs.current_dir().map_err(|source| ModuleError::Io {
                    path: root.clone(),
                    source,
                })?);
            }
            absolute.push(path::absolutize(root, cwd.as_deref().unwrap_or(Path::new("."))));
        }

        Ok(absolute)
    }

    /// Apply the probe sequence to a single absolute root
    fn probe_root(&self, root: &Path, identifier: &str) -> Option<PathBuf> {
        let joined = path::join(root, identifier);

        // Try exact path first
        trace!("probing {}", joined.display());
        if self.fs.is_file(&joined) {
            return Some(joined);
        }

        // Try with extensions appended
        for ext in &self.probes.extensions {
            let candidate = with_appended_extension(&joined, ext);
            trace!("probing {}", candidate.display());
            if self.fs.is_file(&candidate) {
                return Some(candidate);
            }
        }

        // Try as directory with entry file
        if self.fs.is_dir(&joined) {
            for entry in &self.probes.entry_files {
                let candidate = joined.join(entry);
                trace!("probing {}", candidate.display());
                if self.fs.is_file(&candidate) {
                    return Some(candidate);
                }
            }
        }

        None
    }
}

/// `foo/bar` + `ks` → `foo/bar.ks`, keeping any existing dots in the name
fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext.trim_start_matches('.'));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io;

    /// In-memory tree: a set of file paths; directories are implied.
    struct MemoryFs {
        files: BTreeSet<PathBuf>,
        cwd: PathBuf,
    }

    impl MemoryFs {
        fn new(cwd: &str, files: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                files: files.iter().map(PathBuf::from).collect(),
                cwd: PathBuf::from(cwd),
            })
        }
    }

    impl FileSystem for MemoryFs {
        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.files
                .iter()
                .any(|f| f.starts_with(path) && f.as_path() != path)
        }

        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            Ok(String::new())
        }

        fn current_dir(&self) -> io::Result<PathBuf> {
            Ok(self.cwd.clone())
        }
    }

    fn resolver(fs: Arc<MemoryFs>) -> ModuleResolver {
        ModuleResolver::new(ProbeConfig::default(), fs)
    }

    #[test]
    fn test_exact_file_beats_extension() {
        let fs = MemoryFs::new("/", &["/lib/foo", "/lib/foo.ks"]);
        let found = resolver(fs).resolve("foo", &[PathBuf::from("/lib")]).unwrap();
        assert_eq!(found, PathBuf::from("/lib/foo"));
    }

    #[test]
    fn test_extension_beats_directory_entry() {
        let fs = MemoryFs::new("/", &["/lib/foo.ks", "/lib/foo/init.ks"]);
        let found = resolver(fs).resolve("foo", &[PathBuf::from("/lib")]).unwrap();
        assert_eq!(found, PathBuf::from("/lib/foo.ks"));
    }

    #[test]
    fn test_directory_entry_file() {
        let fs = MemoryFs::new("/", &["/lib/pkg/init.ks"]);
        let found = resolver(fs).resolve("pkg", &[PathBuf::from("/lib")]).unwrap();
        assert_eq!(found, PathBuf::from("/lib/pkg/init.ks"));
    }

    #[test]
    fn test_first_matching_root_wins() {
        let fs = MemoryFs::new("/", &["/second/util.ks", "/first/util/init.ks"]);
        let roots = [PathBuf::from("/first"), PathBuf::from("/second")];
        let found = resolver(fs).resolve("util", &roots).unwrap();
        assert_eq!(found, PathBuf::from("/first/util/init.ks"));
    }

    #[test]
    fn test_relative_root_is_made_absolute_against_cwd() {
        let fs = MemoryFs::new("/work", &["/work/scripts/mod.ks"]);
        let found = resolver(fs)
            .resolve("mod", &[PathBuf::from("scripts")])
            .unwrap();
        assert_eq!(found, PathBuf::from("/work/scripts/mod.ks"));
    }

    #[test]
    fn test_relative_identifier_is_normalized() {
        let fs = MemoryFs::new("/", &["/lib/shared/util.ks"]);
        let found = resolver(fs)
            .resolve("../shared/util", &[PathBuf::from("/lib/pkg")])
            .unwrap();
        assert_eq!(found, PathBuf::from("/lib/shared/util.ks"));
    }

    #[test]
    fn test_not_found_names_identifier() {
        let fs = MemoryFs::new("/", &["/lib/other.ks"]);
        let err = resolver(fs)
            .resolve("does_not_exist", &[PathBuf::from("/lib")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot find module 'does_not_exist'");
    }

    #[test]
    fn test_configured_suffixes() {
        let fs = MemoryFs::new("/", &["/lib/a.lua", "/lib/b/main.lua"]);
        let probes = ProbeConfig {
            extensions: vec![".lua".to_string()],
            entry_files: vec!["main.lua".to_string()],
        };
        let resolver = ModuleResolver::new(probes, fs);
        let roots = [PathBuf::from("/lib")];
        assert_eq!(resolver.resolve("a", &roots).unwrap(), PathBuf::from("/lib/a.lua"));
        assert_eq!(
            resolver.resolve("b", &roots).unwrap(),
            PathBuf::from("/lib/b/main.lua")
        );
    }

    #[test]
    fn test_candidates_cover_every_probe() {
        let fs = MemoryFs::new("/work", &[]);
        let found = resolver(fs)
            .candidates("./util", &[PathBuf::from("/lib"), PathBuf::from("scripts")])
            .unwrap();
        let expected: Vec<PathBuf> = [
            "/lib/util.ks",
            "/lib/util/init.ks",
            "/lib/util",
            "/work/scripts/util.ks",
            "/work/scripts/util/init.ks",
            "/work/scripts/util",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_with_appended_extension_keeps_dots() {
        assert_eq!(
            with_appended_extension(Path::new("/lib/v1.2"), "ks"),
            PathBuf::from("/lib/v1.2.ks")
        );
    }
}
