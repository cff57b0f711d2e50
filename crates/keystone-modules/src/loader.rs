// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves, caches and evaluates modules
//!
//! A file-based module's record is inserted into the cache *before* its body
//! runs. A cycle A → B → A therefore hands B the (possibly half-populated)
//! exports of A instead of evaluating A a second time.

use crate::cache::ModuleCache;
use crate::config::LoaderConfig;
use crate::error::{ErrorKind, ModuleError, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::identifier;
use crate::native::NativeRegistry;
use crate::path;
use crate::record::{CacheKey, ModuleRecord, ModuleState};
use crate::resolver::{ModuleResolver, ProbeConfig};
use crate::search_path::SearchPath;
use crate::value::Exports;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Executes module source text.
///
/// The evaluator receives the loader back so that the module body can issue
/// nested requires; those are plain recursive calls into
/// [`ModuleLoader::require`].
pub trait ScriptEvaluator {
    /// Run `source` as the body of `module`, populating `module.exports()`.
    fn evaluate(&mut self, loader: &mut ModuleLoader, source: &str, module: &ModuleRecord) -> Result<()>;
}

impl<F> ScriptEvaluator for F
where
    F: FnMut(&mut ModuleLoader, &str, &ModuleRecord) -> Result<()>,
{
    fn evaluate(&mut self, loader: &mut ModuleLoader, source: &str, module: &ModuleRecord) -> Result<()> {
        (*self)(loader, source, module)
    }
}

/// Where an identifier points, without loading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Host-provided module
    Native(String),
    /// Absolute path of a module file
    File(PathBuf),
}

/// Module loader
pub struct ModuleLoader {
    /// Module resolver
    resolver: ModuleResolver,
    /// Directories searched for file-based modules
    search_path: SearchPath,
    /// Module cache
    cache: ModuleCache,
    /// Host native modules
    natives: Option<Arc<dyn NativeRegistry>>,
    /// Native names, captured once when the registry is attached
    native_names: BTreeSet<String>,
    /// Filesystem probes
    fs: Arc<dyn FileSystem>,
    /// Modules whose bodies are currently running, innermost last
    executing: Vec<ModuleRecord>,
    /// Entry script, if one was run through [`ModuleLoader::run_main`]
    main: Option<ModuleRecord>,
}

impl ModuleLoader {
    /// Create a loader over `search_path` with default probes, the local
    /// filesystem and no native modules
    pub fn new(search_path: SearchPath) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem);
        Self {
            resolver: ModuleResolver::new(ProbeConfig::default(), Arc::clone(&fs)),
            search_path,
            cache: ModuleCache::new(),
            natives: None,
            native_names: BTreeSet::new(),
            fs,
            executing: Vec::new(),
            main: None,
        }
    }

    /// Create a loader from configuration, assembling the search path from
    /// the environment
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(SearchPath::from_environment(config)).with_probes(config.probes())
    }

    /// Use different probe suffixes
    pub fn with_probes(mut self, probes: ProbeConfig) -> Self {
        self.resolver = ModuleResolver::new(probes, Arc::clone(&self.fs));
        self
    }

    /// Use a different filesystem
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.resolver = ModuleResolver::new(self.resolver.probes().clone(), Arc::clone(&fs));
        self.fs = fs;
        self
    }

    /// Attach the host's native module registry
    pub fn with_natives(mut self, registry: impl NativeRegistry + 'static) -> Self {
        self.native_names = registry.names().into_iter().collect();
        debug!("Native modules: {:?}", self.native_names);
        self.natives = Some(Arc::new(registry));
        self
    }

    /// Load a module and return its exports
    pub fn require(
        &mut self,
        evaluator: &mut dyn ScriptEvaluator,
        identifier: &str,
        reload: bool,
    ) -> Result<Exports> {
        self.load(evaluator, identifier, reload)
            .map(|record| record.exports().clone())
    }

    /// Load a module and return its record
    ///
    /// With `reload` set, a cached file-based module is evicted and
    /// evaluated again into a fresh record. If the target no longer
    /// resolves, any cached record at one of its probe locations is evicted
    /// and `NotFound` is returned. Native modules are materialized once per
    /// cache and ignore `reload`.
    #[instrument(level = "debug", skip(self, evaluator))]
    pub fn load(
        &mut self,
        evaluator: &mut dyn ScriptEvaluator,
        identifier: &str,
        reload: bool,
    ) -> Result<ModuleRecord> {
        identifier::validate(identifier)?;

        if self.is_native(identifier) {
            return self.load_native(identifier, reload);
        }

        let path = match self.resolve_file(identifier) {
            Ok(path) => path,
            Err(err) => {
                if reload && err.kind() == ErrorKind::NotFound {
                    self.evict_stale(identifier)?;
                }
                return Err(err);
            }
        };
        self.load_file(evaluator, path, reload)
    }

    /// Resolve an identifier without loading it
    pub fn resolve(&self, identifier: &str) -> Result<Resolved> {
        identifier::validate(identifier)?;

        if self.is_native(identifier) {
            return Ok(Resolved::Native(identifier.to_string()));
        }

        self.resolve_file(identifier).map(Resolved::File)
    }

    /// Run an entry script as a module.
    ///
    /// Unlike [`require`](Self::require) this is a host operation, so `path`
    /// may be absolute or relative to the working directory. Any cached
    /// record for the file is replaced.
    pub fn run_main(&mut self, evaluator: &mut dyn ScriptEvaluator, path: &Path) -> Result<ModuleRecord> {
        let cwd = self.current_dir()?;
        let path = path::absolutize(path, &cwd);
        if !self.fs.is_file(&path) {
            return Err(ModuleError::not_found(path.display().to_string()));
        }

        self.cache.evict(&CacheKey::File(path.clone()));
        let (record, source) = self.instantiate(path)?;
        self.main = Some(record.clone());
        self.evaluate(evaluator, &source, &record)?;
        Ok(record)
    }

    /// Drop the cache entry an identifier currently resolves to
    pub fn evict(&mut self, identifier: &str) -> Result<Option<ModuleRecord>> {
        let key = match self.resolve(identifier)? {
            Resolved::Native(name) => CacheKey::Native(name),
            Resolved::File(path) => CacheKey::File(path),
        };
        Ok(self.cache.evict(&key))
    }

    /// Clear the module cache
    pub fn clear_cache(&mut self) {
        debug!("Clearing {} cached modules", self.cache.len());
        self.cache.clear();
    }

    /// Get the module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Get the search path
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Get the probe suffixes
    pub fn probes(&self) -> &ProbeConfig {
        self.resolver.probes()
    }

    /// Check if a name refers to a native module
    pub fn is_native(&self, name: &str) -> bool {
        self.native_names.contains(name)
    }

    /// Native module names, sorted
    pub fn native_names(&self) -> impl Iterator<Item = &str> {
        self.native_names.iter().map(String::as_str)
    }

    /// The module whose body is currently running
    pub fn current_module(&self) -> Option<&ModuleRecord> {
        self.executing.last()
    }

    /// The entry module
    pub fn main(&self) -> Option<&ModuleRecord> {
        self.main.as_ref()
    }

    fn load_native(&mut self, name: &str, reload: bool) -> Result<ModuleRecord> {
        let key = CacheKey::Native(name.to_string());

        // Check cache
        if let Some(cached) = self.cache.get(&key) {
            if reload {
                debug!("Ignoring reload of native module '{}'", name);
            }
            trace!("Cache hit for {}", key);
            return Ok(cached);
        }

        let registry = self
            .natives
            .as_ref()
            .ok_or_else(|| ModuleError::native(name, "no native registry attached"))?;
        debug!("Materializing native module '{}'", name);
        let exports = registry.load(name)?;

        let record = ModuleRecord::native(name, exports);
        self.cache.put(key, record.clone());
        Ok(record)
    }

    fn load_file(
        &mut self,
        evaluator: &mut dyn ScriptEvaluator,
        path: PathBuf,
        reload: bool,
    ) -> Result<ModuleRecord> {
        let key = CacheKey::File(path.clone());

        if reload {
            if self.cache.evict(&key).is_some() {
                debug!("Evicted {} for reload", key);
            }
        } else if let Some(cached) = self.cache.get(&key) {
            trace!("Cache hit for {}", key);
            return Ok(cached);
        }

        let (record, source) = self.instantiate(path)?;
        self.evaluate(evaluator, &source, &record)?;
        Ok(record)
    }

    /// Read the source, create the record and cache it ahead of evaluation
    fn instantiate(&mut self, path: PathBuf) -> Result<(ModuleRecord, String)> {
        let source = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ModuleError::Io {
                path: path.clone(),
                source,
            })?;

        let record = ModuleRecord::file(path);
        debug!("Created module record for {}", record.key());
        self.cache.put(record.key().clone(), record.clone());
        Ok((record, source))
    }

    fn evaluate(
        &mut self,
        evaluator: &mut dyn ScriptEvaluator,
        source: &str,
        record: &ModuleRecord,
    ) -> Result<()> {
        self.executing.push(record.clone());
        let result = evaluator.evaluate(self, source, record);
        self.executing.pop();

        match result {
            Ok(()) => {
                record.set_state(ModuleState::Loaded);
                Ok(())
            }
            Err(err) => {
                // The record stays cached; only a reload re-runs it.
                record.set_state(ModuleState::Failed);
                warn!("Module {} failed: {}", record.key(), err);
                Err(err)
            }
        }
    }

    fn resolve_file(&self, identifier: &str) -> Result<PathBuf> {
        let roots = self.roots_for(identifier)?;
        self.resolver.resolve(identifier, &roots)
    }

    /// Drop cached records left behind by a module whose file is gone
    fn evict_stale(&mut self, identifier: &str) -> Result<()> {
        let roots = self.roots_for(identifier)?;
        for candidate in self.resolver.candidates(identifier, &roots)? {
            if self.cache.evict(&CacheKey::File(candidate)).is_some() {
                debug!("Evicted stale record for '{}'", identifier);
            }
        }
        Ok(())
    }

    fn roots_for(&self, identifier: &str) -> Result<Vec<PathBuf>> {
        let base = if identifier::is_relative(identifier) {
            Some(self.relative_base()?)
        } else {
            None
        };
        Ok(self.search_path.candidates(base.as_deref()))
    }

    /// Directory relative identifiers resolve against: the running module's
    /// own directory, or the working directory at top level
    fn relative_base(&self) -> Result<PathBuf> {
        match self.current_module().and_then(ModuleRecord::directory) {
            Some(dir) => Ok(dir.to_path_buf()),
            None => self.current_dir(),
        }
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.fs.current_dir().map_err(|source| ModuleError::Io {
            path: PathBuf::from("."),
            source,
        })
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(SearchPath::new())
    }
}
