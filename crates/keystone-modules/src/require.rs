// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script-facing require() implementation
//!
//! These functions take dynamic script arguments, so they are where
//! argument types are checked before the loader sees them.

use crate::error::{ModuleError, Result};
use crate::loader::{ModuleLoader, Resolved, ScriptEvaluator};
use crate::value::Value;

/// The require() function: `require(identifier [, reload])`
pub fn require(
    loader: &mut ModuleLoader,
    evaluator: &mut dyn ScriptEvaluator,
    args: &[Value],
) -> Result<Value> {
    let identifier = identifier_arg(args)?;
    let reload = match args.get(1) {
        None | Some(Value::Nil) => false,
        Some(Value::Bool(reload)) => *reload,
        Some(other) => {
            return Err(ModuleError::type_error(format!(
                "parameter 'reload' must be a boolean, got {}",
                other.type_name()
            )))
        }
    };

    loader
        .require(evaluator, identifier, reload)
        .map(Value::Module)
}

/// require.resolve() - get the resolved path without loading
pub fn require_resolve(loader: &ModuleLoader, args: &[Value]) -> Result<Value> {
    let identifier = identifier_arg(args)?;

    match loader.resolve(identifier)? {
        Resolved::Native(name) => Ok(Value::String(name)),
        Resolved::File(path) => Ok(Value::String(path.display().to_string())),
    }
}

/// require.cache - the resolution keys currently cached
pub fn require_cache(loader: &ModuleLoader) -> Value {
    Value::List(
        loader
            .cache()
            .keys()
            .into_iter()
            .map(|key| Value::String(key.to_string()))
            .collect(),
    )
}

/// Names of the host's native modules
pub fn builtin_modules(loader: &ModuleLoader) -> Vec<String> {
    loader.native_names().map(String::from).collect()
}

/// Check if a name refers to a native module
pub fn is_builtin(loader: &ModuleLoader, name: &str) -> bool {
    loader.is_native(name)
}

fn identifier_arg(args: &[Value]) -> Result<&str> {
    match args.first() {
        Some(Value::String(identifier)) => Ok(identifier),
        Some(other) => Err(ModuleError::type_error(format!(
            "parameter 'identifier' must be a string, got {}",
            other.type_name()
        ))),
        None => Err(ModuleError::type_error("parameter 'identifier' is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::native::NativeModules;
    use crate::record::ModuleRecord;
    use crate::search_path::SearchPath;
    use crate::value::Exports;
    use tempfile::tempdir;

    fn no_op(_: &mut ModuleLoader, _: &str, _: &ModuleRecord) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_non_string_identifier_is_type_error() {
        let mut loader = ModuleLoader::default();
        let mut eval = no_op;
        let err = require(&mut loader, &mut eval, &[Value::Number(42.0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("'identifier'"));

        let err = require(&mut loader, &mut eval, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_non_boolean_reload_is_type_error() {
        let mut loader = ModuleLoader::default();
        let mut eval = no_op;
        let err = require(
            &mut loader,
            &mut eval,
            &[Value::from("util"), Value::from("yes")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(err.to_string().contains("'reload'"));
    }

    #[test]
    fn test_resolve_and_cache_listing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("util.ks"), "").unwrap();

        let natives = NativeModules::new().with("sys", || Ok(Exports::new()));
        let mut loader = ModuleLoader::new(SearchPath::from_dirs([dir.path()])).with_natives(natives);
        let mut eval = no_op;

        let resolved = require_resolve(&loader, &[Value::from("util")]).unwrap();
        let expected = dir.path().join("util.ks").display().to_string();
        assert_eq!(resolved, Value::String(expected.clone()));
        assert_eq!(require_resolve(&loader, &[Value::from("sys")]).unwrap(), Value::from("sys"));
        assert_eq!(require_cache(&loader), Value::List(vec![]));

        let util = require(&mut loader, &mut eval, &[Value::from("util")]).unwrap();
        assert!(util.as_module().is_some());
        require(&mut loader, &mut eval, &[Value::from("sys"), Value::Nil]).unwrap();
        assert_eq!(
            require_cache(&loader),
            Value::List(vec![Value::String(expected), Value::from("native:sys")])
        );

        assert_eq!(builtin_modules(&loader), vec!["sys".to_string()]);
        assert!(is_builtin(&loader, "sys"));
        assert!(!is_builtin(&loader, "util"));
    }
}
