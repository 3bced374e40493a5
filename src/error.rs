//! Error types for the named operation registry
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Failures reported by a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Conditional insert found the key already present
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    /// Empty or oversized key/value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Backend is full
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Backend could not be reached or timed out
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// == Registry Error Enum ==
/// Errors surfaced by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Missing name, malformed entry or entry failing its invariants
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An entry with this name exists and overwrite was not requested
    #[error("Named operation already exists: {0}")]
    Overwriting(String),

    /// Access denied, or no such entry
    #[error("User {user} does not have permission to {action} named operation: {name}")]
    Unauthorized {
        user: String,
        action: &'static str,
        name: String,
    },

    /// Cache backend failure
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<CacheError> for RegistryError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidInput(msg) => RegistryError::InvalidArgument(msg),
            CacheError::AlreadyExists(key) => RegistryError::Overwriting(key),
            other => RegistryError::BackendUnavailable(other.to_string()),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
