// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # keystone-modules
//!
//! Module resolution, caching and loading for Keystone scripts.
//!
//! A script asks for a module with `require(identifier [, reload])`. The
//! loader then:
//!
//! - validates the identifier (non-empty, no backslashes, not absolute)
//! - hands back a host-provided native module if the name matches one
//! - otherwise probes each search root for `<id>`, `<id>.ks` and
//!   `<id>/init.ks`, relative identifiers starting at the requesting
//!   module's own directory
//! - caches the module record before running its body, so cycles observe
//!   partially populated exports instead of recursing forever
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keystone_modules::{LoaderConfig, ModuleLoader, NativeModules};
//!
//! let config = LoaderConfig::load()?;
//! let natives = NativeModules::new().with("sys", sys_module);
//! let mut loader = ModuleLoader::from_config(&config).with_natives(natives);
//!
//! let exports = loader.require(&mut engine, "util/strings", false)?;
//! ```
//!
//! The script language itself lives behind [`ScriptEvaluator`]; this crate
//! never parses source text.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fs;
pub mod identifier;
pub mod loader;
pub mod native;
pub mod path;
pub mod record;
pub mod require;
pub mod resolver;
pub mod search_path;
pub mod value;

pub use cache::ModuleCache;
pub use config::LoaderConfig;
pub use error::{BoxError, ErrorKind, ModuleError, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use loader::{ModuleLoader, Resolved, ScriptEvaluator};
pub use native::{NativeModules, NativeRegistry};
pub use record::{CacheKey, ModuleRecord, ModuleState};
pub use resolver::{ModuleResolver, ProbeConfig};
pub use search_path::SearchPath;
pub use value::{Exports, NativeFn, NativeFunction, Value};
