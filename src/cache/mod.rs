//! Cache Module
//!
//! Reference-counted caching: records live while handles to them exist and
//! are reclaimed after a grace period or an absolute expiry.

mod handle;
mod hasher;
mod record;
mod stats;
mod store;
mod weak;


// Re-export public types
pub use handle::Handle;
pub use stats::CacheStats;
pub use weak::WeakCache;

pub(crate) use hasher::KeyHasher;
pub(crate) use record::Record;
pub(crate) use store::{RecordStore, Release};
