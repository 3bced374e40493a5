//! HashMap Cache Service
//!
//! In-process backend storing entries in a HashMap behind a tokio RwLock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{validate_input, CacheResult, CacheService, CacheStats};
use crate::error::CacheError;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, String>,
    stats: CacheStats,
}

impl Inner {
    fn ensure_capacity(&self, key: &str, max_entries: usize) -> CacheResult<()> {
        if !self.entries.contains_key(key) && self.entries.len() >= max_entries {
            return Err(CacheError::CapacityExceeded(format!(
                "Cache is full ({} entries)",
                max_entries
            )));
        }
        Ok(())
    }

    fn store(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.stats.record_write();
        self.stats.set_total_entries(self.entries.len());
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_removal();
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }
}

// == HashMap Cache Service ==
/// Process-local cache backend.
///
/// All mutations take the write lock, so `put_if_absent` is atomic with
/// respect to every other call on the same instance. Entries are never
/// evicted: once `max_entries` is reached new keys are rejected.
#[derive(Debug)]
pub struct HashMapCacheService {
    inner: RwLock<Inner>,
    max_entries: usize,
}

impl HashMapCacheService {
    // == Constructor ==
    /// Creates an empty backend holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_entries,
        }
    }

    // == Stats ==
    /// Returns current backend statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}

impl Default for HashMapCacheService {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheService for HashMapCacheService {
    async fn put(&self, key: &str, value: String) -> CacheResult<()> {
        validate_input(key, Some(&value))?;

        let mut inner = self.inner.write().await;
        inner.ensure_capacity(key, self.max_entries)?;
        inner.store(key, value);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: String) -> CacheResult<()> {
        validate_input(key, Some(&value))?;

        // Existence check and insert happen under one write guard
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(key) {
            inner.stats.record_conflict();
            return Err(CacheError::AlreadyExists(key.to_string()));
        }
        inner.ensure_capacity(key, self.max_entries)?;
        inner.store(key, value);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        validate_input(key, None)?;

        // Write lock needed for stats update
        let mut inner = self.inner.write().await;
        let value = inner.entries.get(key).cloned();
        match value {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        Ok(value)
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        validate_input(key, None)?;

        Ok(self.inner.write().await.remove(key))
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.entries.keys().cloned().collect())
    }

    async fn values(&self) -> CacheResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.entries.values().cloned().collect())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        Ok(self.inner.read().await.entries.len())
    }
}
