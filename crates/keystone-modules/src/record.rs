// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records: exports plus identity metadata

use crate::value::Exports;
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolution key identifying a cached module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Absolute, normalized path of a file-based module
    File(PathBuf),
    /// Declared name of a native module
    Native(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::File(path) => write!(f, "{}", path.display()),
            CacheKey::Native(name) => write!(f, "native:{}", name),
        }
    }
}

/// Evaluation state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// The module body is running (or was interrupted mid-cycle)
    Loading,
    /// The module body ran to completion
    Loaded,
    /// The module body raised an error
    Failed,
}

#[derive(Debug)]
struct RecordInner {
    key: CacheKey,
    directory: Option<PathBuf>,
    exports: Exports,
    state: RwLock<ModuleState>,
}

/// A loaded (or loading) module
///
/// Records are shared handles; clones refer to the same module.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    inner: Arc<RecordInner>,
}

impl ModuleRecord {
    /// Create a record for a file-based module at an absolute path
    pub fn file(path: PathBuf) -> Self {
        let directory = path.parent().map(Path::to_path_buf);
        Self {
            inner: Arc::new(RecordInner {
                key: CacheKey::File(path),
                directory,
                exports: Exports::new(),
                state: RwLock::new(ModuleState::Loading),
            }),
        }
    }

    /// Create a record around a host-materialized native module
    pub fn native(name: impl Into<String>, exports: Exports) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                key: CacheKey::Native(name.into()),
                directory: None,
                exports,
                state: RwLock::new(ModuleState::Loaded),
            }),
        }
    }

    /// The cache key of this module
    pub fn key(&self) -> &CacheKey {
        &self.inner.key
    }

    /// The module's file path, for file-based modules
    pub fn path(&self) -> Option<&Path> {
        match &self.inner.key {
            CacheKey::File(path) => Some(path),
            CacheKey::Native(_) => None,
        }
    }

    /// The containing directory, for file-based modules
    pub fn directory(&self) -> Option<&Path> {
        self.inner.directory.as_deref()
    }

    /// The module's exports object
    pub fn exports(&self) -> &Exports {
        &self.inner.exports
    }

    /// Current evaluation state
    pub fn state(&self) -> ModuleState {
        *self.inner.state.read()
    }

    pub(crate) fn set_state(&self, state: ModuleState) {
        *self.inner.state.write() = state;
    }

    /// Whether this is a native module
    pub fn is_native(&self) -> bool {
        matches!(self.inner.key, CacheKey::Native(_))
    }

    /// Whether both handles refer to the same record
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_derives_directory() {
        let record = ModuleRecord::file(PathBuf::from("/opt/keystone/lib/util.ks"));
        assert_eq!(record.directory(), Some(Path::new("/opt/keystone/lib")));
        assert_eq!(record.path(), Some(Path::new("/opt/keystone/lib/util.ks")));
        assert_eq!(record.state(), ModuleState::Loading);
        assert!(record.exports().is_empty());
        assert!(!record.is_native());
    }

    #[test]
    fn test_native_record_has_no_directory() {
        let exports = Exports::new();
        exports.set("version", "1.0");
        let record = ModuleRecord::native("sys", exports.clone());
        assert_eq!(record.directory(), None);
        assert_eq!(record.path(), None);
        assert!(record.exports().ptr_eq(&exports));
        assert_eq!(record.key().to_string(), "native:sys");
        assert_eq!(record.state(), ModuleState::Loaded);
    }

    #[test]
    fn test_clones_share_identity() {
        let record = ModuleRecord::file(PathBuf::from("/tmp/a.ks"));
        let clone = record.clone();
        clone.set_state(ModuleState::Loaded);
        assert!(record.ptr_eq(&clone));
        assert_eq!(record.state(), ModuleState::Loaded);
        assert!(!record.ptr_eq(&ModuleRecord::file(PathBuf::from("/tmp/a.ks"))));
    }
}
