// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native module registry supplied by the host application

use crate::error::{ModuleError, Result};
use crate::value::Exports;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Host-side source of native modules.
///
/// The loader asks for [`names`](NativeRegistry::names) once, when the
/// registry is attached, and calls [`load`](NativeRegistry::load) at most
/// once per name for the lifetime of its cache.
pub trait NativeRegistry: Send + Sync {
    /// The closed list of native module names
    fn names(&self) -> Vec<String>;

    /// Materialize the native module called `name`
    fn load(&self, name: &str) -> Result<Exports>;
}

type Factory = Arc<dyn Fn() -> Result<Exports> + Send + Sync>;

/// A [`NativeRegistry`] built from named factory closures
#[derive(Clone, Default)]
pub struct NativeModules {
    factories: BTreeMap<String, Factory>,
}

impl NativeModules {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native module factory
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Exports> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register a native module factory (builder form)
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Exports> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Whether a module with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl NativeRegistry for NativeModules {
    fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    fn load(&self, name: &str) -> Result<Exports> {
        match self.factories.get(name) {
            Some(factory) => factory(),
            None => Err(ModuleError::native(name, "not registered")),
        }
    }
}

impl fmt::Debug for NativeModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModules")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_register_and_load() {
        let registry = NativeModules::new().with("sys", || {
            let exports = Exports::new();
            exports.set("platform", std::env::consts::OS);
            Ok(exports)
        });

        assert_eq!(registry.names(), vec!["sys".to_string()]);
        assert!(registry.contains("sys"));
        let sys = registry.load("sys").unwrap();
        assert_eq!(sys.get("platform"), Some(Value::from(std::env::consts::OS)));
    }

    #[test]
    fn test_each_load_calls_the_factory() {
        let registry = NativeModules::new().with("fresh", || Ok(Exports::new()));
        let a = registry.load("fresh").unwrap();
        let b = registry.load("fresh").unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_unknown_name() {
        let registry = NativeModules::new();
        let err = registry.load("nope").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Native);
    }
}
