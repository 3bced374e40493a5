//! Cache Module
//!
//! The pluggable key-value contract the registry persists entries through,
//! plus an in-memory implementation.

mod backend;
mod hashmap;
mod stats;


use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use backend::CacheBackend;
pub use hashmap::HashMapCacheService;
pub use stats::CacheStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Result type for cache backends.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == Cache Service ==
/// Key-value backend shared by one or more registries.
///
/// Implementations may be distributed, so callers must not assume that a
/// `get` followed by a `put` is atomic. `put_if_absent` is the only
/// conditional write and must fail with [`CacheError::AlreadyExists`] when
/// the key is present.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Unconditional upsert.
    async fn put(&self, key: &str, value: String) -> CacheResult<()>;

    /// Inserts only when `key` is absent.
    async fn put_if_absent(&self, key: &str, value: String) -> CacheResult<()>;

    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Removes `key`, returning whether it was present.
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Snapshot of every key currently stored.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Snapshot of every value currently stored.
    async fn values(&self) -> CacheResult<Vec<String>>;

    /// Removes every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Number of stored entries.
    async fn len(&self) -> CacheResult<usize>;
}

/// Rejects keys and values a backend must never accept.
pub fn validate_input(key: &str, value: Option<&str>) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidInput("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidInput(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if let Some(value) = value {
        if value.is_empty() {
            return Err(CacheError::InvalidInput("Value cannot be empty".to_string()));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidInput(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
    }
    Ok(())
}
