//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Producer failures are never wrapped here: `WeakCache::fetch` hands them
//! back to the caller with their own type.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The sweep interval must be greater than zero
    #[error("Invalid sweep interval: must be greater than zero")]
    InvalidInterval,

    /// The sweep loop needs a tokio runtime to be spawned on
    #[error("No tokio runtime available to run the sweep loop")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
