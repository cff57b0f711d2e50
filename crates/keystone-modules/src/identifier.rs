// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module identifier validation

use crate::error::{ModuleError, Result};
use crate::path;

/// Separator rejected in identifiers so scripts stay portable
pub const DISALLOWED_SEPARATOR: char = '\\';

/// Check an identifier before any lookup happens.
///
/// Rejects the empty string, backslash separators and absolute paths.
pub fn validate(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(ModuleError::value_error(
            "identifier must contain at least one character",
        ));
    }

    if identifier.contains(DISALLOWED_SEPARATOR) {
        return Err(ModuleError::value_error(format!(
            "identifier '{}' must use '/' as its path separator",
            identifier
        )));
    }

    if path::is_absolute(identifier) {
        return Err(ModuleError::value_error(format!(
            "identifier '{}' is an absolute path; request modules through the search path or a relative marker",
            identifier
        )));
    }

    Ok(())
}

/// Whether the identifier starts with a relative marker (`./`, `../`)
pub fn is_relative(identifier: &str) -> bool {
    identifier == "."
        || identifier == ".."
        || identifier.starts_with("./")
        || identifier.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_validate_rejection_set() {
        for bad in ["", "a\\b", "/abs/path"] {
            let err = validate(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Value, "{:?} should be rejected", bad);
        }
        assert_eq!(
            validate("").unwrap_err().to_string(),
            "ValueError: identifier must contain at least one character"
        );
    }

    #[test]
    fn test_validate_accepts_names_and_relative_paths() {
        for good in ["util", "pkg/sub", "./sibling", "../parent/mod", "."] {
            assert!(validate(good).is_ok(), "{:?} should be accepted", good);
        }
    }

    #[test]
    fn test_is_relative() {
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(is_relative(".."));
        assert!(!is_relative("a/./b"));
        assert!(!is_relative(".hidden"));
        assert!(!is_relative("util"));
    }
}
