// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem probes consumed by the resolver and loader

use std::io;
use std::path::{Path, PathBuf};

/// The filesystem operations module loading depends on.
///
/// Hosts that serve scripts from somewhere other than the local disk (or
/// tests that want to observe probing) can supply their own implementation.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists and is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// The process working directory
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_os_file_system_probes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("mod.ks");
        std::fs::write(&file, "export a = 1").unwrap();

        let fs = OsFileSystem;
        assert!(fs.is_file(&file));
        assert!(!fs.is_dir(&file));
        assert!(fs.is_dir(dir.path()));
        assert!(!fs.is_file(&dir.path().join("missing.ks")));
        assert_eq!(fs.read_to_string(&file).unwrap(), "export a = 1");
    }
}
