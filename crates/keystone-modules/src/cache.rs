// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()

use crate::record::{CacheKey, ModuleRecord};
use dashmap::DashMap;

/// Cache mapping resolution keys to module records
///
/// At most one record exists per key; lookups hand out shared handles, so
/// every hit observes the same exports object.
pub struct ModuleCache {
    cache: DashMap<CacheKey, ModuleRecord>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get a cached module by key
    pub fn get(&self, key: &CacheKey) -> Option<ModuleRecord> {
        self.cache.get(key).map(|entry| entry.value().clone())
    }

    /// Check if a module is cached
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Add a module to the cache, returning any record it replaced
    pub fn put(&self, key: CacheKey, record: ModuleRecord) -> Option<ModuleRecord> {
        self.cache.insert(key, record)
    }

    /// Remove a module from the cache
    pub fn evict(&self, key: &CacheKey) -> Option<ModuleRecord> {
        self.cache.remove(key).map(|(_, record)| record)
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get all cached keys, sorted
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.cache.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_key(path: &str) -> CacheKey {
        CacheKey::File(PathBuf::from(path))
    }

    #[test]
    fn test_get_returns_same_exports() {
        let cache = ModuleCache::new();
        let record = ModuleRecord::file(PathBuf::from("/mods/a.ks"));
        cache.put(record.key().clone(), record.clone());

        let first = cache.get(&file_key("/mods/a.ks")).unwrap();
        let second = cache.get(&file_key("/mods/a.ks")).unwrap();
        assert!(first.exports().ptr_eq(second.exports()));
        assert!(first.ptr_eq(&record));
    }

    #[test]
    fn test_evict_then_put_yields_fresh_record() {
        let cache = ModuleCache::new();
        let old = ModuleRecord::file(PathBuf::from("/mods/a.ks"));
        old.exports().set("stale", true);
        cache.put(old.key().clone(), old.clone());

        let evicted = cache.evict(&file_key("/mods/a.ks")).unwrap();
        assert!(evicted.ptr_eq(&old));
        assert!(!cache.contains(&file_key("/mods/a.ks")));

        let fresh = ModuleRecord::file(PathBuf::from("/mods/a.ks"));
        cache.put(fresh.key().clone(), fresh);
        let cached = cache.get(&file_key("/mods/a.ks")).unwrap();
        assert!(!cached.ptr_eq(&old));
        assert!(cached.exports().is_empty());
    }

    #[test]
    fn test_put_replaces_rather_than_duplicates() {
        let cache = ModuleCache::new();
        let first = ModuleRecord::file(PathBuf::from("/mods/a.ks"));
        let second = ModuleRecord::file(PathBuf::from("/mods/a.ks"));
        assert!(cache.put(first.key().clone(), first.clone()).is_none());
        let replaced = cache.put(second.key().clone(), second).unwrap();
        assert!(replaced.ptr_eq(&first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_native_and_file_keys_are_distinct() {
        let cache = ModuleCache::new();
        cache.put(
            CacheKey::Native("sys".into()),
            ModuleRecord::native("sys", Default::default()),
        );
        let file = ModuleRecord::file(PathBuf::from("/mods/sys"));
        cache.put(file.key().clone(), file);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.keys(),
            vec![file_key("/mods/sys"), CacheKey::Native("sys".into())]
        );

        cache.clear();
        assert!(cache.is_empty());
    }
}
