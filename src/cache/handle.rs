//! Handle Module
//!
//! RAII reference to a cached record.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::store::{Acquired, RecordStore};
use crate::cache::Release;

/// Store shared between a cache, its sweep loop and every issued handle.
pub(crate) type SharedStore<V> = Arc<Mutex<RecordStore<V>>>;

/// A live reference to a cached value.
///
/// The record stays referenced for as long as the handle exists. Dropping
/// the handle releases the reference; once every handle of a record is gone
/// the record starts its grace period and becomes eligible for sweeping.
///
/// Cloning a handle takes another reference to the same record.
///
/// Dropping a handle locks the cache, so a producer passed to
/// [`WeakCache::fetch`](crate::cache::WeakCache::fetch) must not drop a
/// handle of the same cache.
///
/// # Example
/// ```ignore
/// let handle = cache.fetch("user:1", min_ttl, max_ttl, || load_user(1))?;
/// println!("{}", handle.name);
/// drop(handle); // record becomes unreachable
/// ```
pub struct Handle<V> {
    value: Arc<V>,
    index: u64,
    generation: u64,
    store: SharedStore<V>,
}

impl<V> Handle<V> {
    pub(crate) fn new(acquired: Acquired<V>, index: u64, store: SharedStore<V>) -> Self {
        Self {
            value: acquired.value,
            index,
            generation: acquired.generation,
            store,
        }
    }

    /// Returns a reference to the cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns true if both handles refer to the same record.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.value, &other.value)
    }
}

impl<V> Deref for Handle<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<V> Clone for Handle<V> {
    fn clone(&self) -> Self {
        if !self.store.lock().retain(self.index, self.generation) {
            trace!(generation = self.generation, "Cloned handle of a record no longer held");
        }

        Self {
            value: Arc::clone(&self.value),
            index: self.index,
            generation: self.generation,
            store: Arc::clone(&self.store),
        }
    }
}

impl<V> Drop for Handle<V> {
    fn drop(&mut self) {
        let outcome = self
            .store
            .lock()
            .release(self.index, self.generation, Instant::now());

        match outcome {
            Release::Stale => {
                trace!(generation = self.generation, "Released handle of a record no longer held")
            }
            Release::Referenced(remaining) => {
                trace!(generation = self.generation, remaining, "Released handle")
            }
            Release::Unreferenced => {
                trace!(generation = self.generation, "Record became unreachable")
            }
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Handle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("value", &self.value)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<V: fmt::Display> fmt::Display for Handle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}

impl<V: PartialEq> PartialEq for Handle<V> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<V: Eq> Eq for Handle<V> {}
