//! Weak Cache - A reference-counted in-memory cache
//!
//! Records stay cached while callers hold handles to them, survive a grace
//! period once the last handle is dropped, and are reclaimed by a background
//! sweep loop. An optional maximum age bounds every record's lifetime.

pub mod cache;
pub mod config;
pub mod error;
pub(crate) mod tasks;

pub use cache::{CacheStats, Handle, WeakCache};
pub use config::Config;
pub use error::{CacheError, Result};
