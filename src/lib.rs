//! Named Ops - an access-controlled registry of named operations
//!
//! Saves reusable, parameterisable operation chains under a name and shares
//! them through reader/writer authorities, per-entry access predicates and
//! an admin override, on top of a pluggable key-value cache.

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod named;
pub mod telemetry;

pub use access::{AccessKind, AccessPredicate, AccessRule, AccessRules, Identity};
pub use cache::{CacheBackend, CacheService, HashMapCacheService};
pub use config::Config;
pub use error::{CacheError, RegistryError, Result};
pub use named::{NamedOperationDetail, NamedOperationRegistry, ParameterDetail, RegistryConfig};
pub use telemetry::init_tracing;
