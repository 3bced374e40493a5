//! Configuration Module
//!
//! Handles loading registry configuration from environment variables.

use std::env;

use crate::cache::CacheBackend;
use crate::named::RegistryConfig;

/// Default key namespace for named operations.
pub const DEFAULT_NAMESPACE: &str = "namedOperation";

/// Registry configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix applied to every key written by the registry
    pub namespace: String,
    /// Authority granting admin override; empty disables the override
    pub admin_auth: String,
    /// Maximum number of entries the in-memory backend can hold
    pub max_entries: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `NAMED_OPS_NAMESPACE` - Key namespace (default: namedOperation)
    /// - `NAMED_OPS_ADMIN_AUTH` - Admin authority name (default: empty)
    /// - `NAMED_OPS_MAX_ENTRIES` - Maximum backend entries (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env::var("NAMED_OPS_NAMESPACE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.namespace),
            admin_auth: env::var("NAMED_OPS_ADMIN_AUTH").unwrap_or(defaults.admin_auth),
            max_entries: env::var("NAMED_OPS_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
        }
    }

    /// Builds the registry configuration, selecting the in-memory backend.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            namespace: self.namespace.clone(),
            admin_auth: self.admin_auth.clone(),
            backend: CacheBackend::HashMap {
                max_entries: self.max_entries,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            admin_auth: String::new(),
            max_entries: 10_000,
        }
    }
}
