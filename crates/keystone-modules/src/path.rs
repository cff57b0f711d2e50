// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical path helpers used during resolution

use std::path::{Component, Path, PathBuf};

/// Whether `path` is absolute.
///
/// A leading `/` counts as absolute on every platform so that identifiers
/// are judged the same way everywhere.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || Path::new(path).is_absolute()
}

/// Join `segment` onto `base` and normalize the result
pub fn join(base: &Path, segment: &str) -> PathBuf {
    normalize(&base.join(segment))
}

/// Normalize a path lexically: drop `.` components and fold `..` into
/// their parent. Symlinks are not consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::RootDir => result.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    result.pop();
                    depth -= 1;
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            Component::Normal(segment) => {
                result.push(segment);
                depth += 1;
            }
        }
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Make `path` absolute against `cwd` (if needed) and normalize it
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("/abs/path"));
        assert!(!is_absolute("rel/path"));
        assert!(!is_absolute("./rel"));
        assert!(!is_absolute(""));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/../../..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_join_folds_relative_markers() {
        assert_eq!(
            join(Path::new("/mods/pkg"), "../shared/util"),
            PathBuf::from("/mods/shared/util")
        );
        assert_eq!(join(Path::new("/mods"), "./x"), PathBuf::from("/mods/x"));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize(Path::new("lib"), Path::new("/work")),
            PathBuf::from("/work/lib")
        );
        assert_eq!(
            absolutize(Path::new("/opt/lib/."), Path::new("/work")),
            PathBuf::from("/opt/lib")
        );
    }
}
