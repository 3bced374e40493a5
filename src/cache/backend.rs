//! Cache Backend Selection
//!
//! Explicit backend choice passed to the registry at construction time.

use std::sync::Arc;

use crate::cache::{CacheService, HashMapCacheService};

/// Which cache backend a registry should build for itself.
#[derive(Debug, Clone)]
pub enum CacheBackend {
    /// Process-local map bounded to `max_entries`
    HashMap { max_entries: usize },
}

impl CacheBackend {
    /// Instantiates the selected backend.
    pub fn build(&self) -> Arc<dyn CacheService> {
        match self {
            CacheBackend::HashMap { max_entries } => {
                Arc::new(HashMapCacheService::new(*max_entries))
            }
        }
    }
}

impl Default for CacheBackend {
    fn default() -> Self {
        CacheBackend::HashMap {
            max_entries: 10_000,
        }
    }
}
