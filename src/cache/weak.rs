//! Weak Cache Module
//!
//! Public cache type: a record store behind a single mutex, a seeded key
//! hasher and a background sweep loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::info;

use crate::cache::handle::SharedStore;
use crate::cache::{CacheStats, Handle, KeyHasher, RecordStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweep_task;

// == Weak Cache ==
/// Reference-counted cache whose records are reclaimed once unreferenced.
///
/// Every successful [`fetch`](WeakCache::fetch) returns a [`Handle`]. A
/// record lives as long as any handle to it does, then survives its
/// `min_ttl` grace period before the sweep loop reclaims it. `max_ttl`
/// bounds a record's age: an unreferenced record past it is swept, a
/// referenced one is replaced by the next fetch of its key.
///
/// All operations are serialized by one lock. The producer runs while the
/// lock is held, so a slow producer stalls every other caller.
pub struct WeakCache<V> {
    /// Records shared with handles and the sweep loop
    store: SharedStore<V>,
    /// Key to index mapping
    hasher: KeyHasher,
    /// Stops the sweep loop once set to true
    shutdown: watch::Sender<bool>,
}

impl<V: Send + Sync + 'static> WeakCache<V> {
    // == Constructor ==
    /// Creates an empty cache and starts its sweep loop.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    /// * `gc_interval` - Interval between sweeps of unreferenced records
    pub fn new(gc_interval: Duration) -> Result<Self> {
        if gc_interval.is_zero() {
            return Err(CacheError::InvalidInterval);
        }
        tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let store: SharedStore<V> = Arc::new(Mutex::new(RecordStore::new()));
        let (shutdown, shutdown_rx) = watch::channel(false);
        spawn_sweep_task(Arc::clone(&store), gc_interval, shutdown_rx);

        Ok(Self {
            store,
            hasher: KeyHasher::new(),
            shutdown,
        })
    }

    /// Creates a cache using the sweep interval from the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.gc_interval())
    }
}

impl<V> WeakCache<V> {
    // == Fetch ==
    /// Gets or creates the record for `key` and returns a handle to it.
    ///
    /// `producer` is called only if no live record exists for `key`; its
    /// error is returned unchanged and leaves the cache untouched.
    ///
    /// # Arguments
    /// * `key` - The key to fetch
    /// * `min_ttl` - How long the record survives once unreferenced
    /// * `max_ttl` - Maximum lifetime of the record, zero = unbounded
    /// * `producer` - Computes the value on a miss
    pub fn fetch<F, E>(
        &self,
        key: &str,
        min_ttl: Duration,
        max_ttl: Duration,
        producer: F,
    ) -> std::result::Result<Handle<V>, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        let index = self.hasher.index(key);

        let acquired = {
            let mut store = self.store.lock();
            store.acquire(index, key, min_ttl, max_ttl, Instant::now(), producer)?
        };

        Ok(Handle::new(acquired, index, Arc::clone(&self.store)))
    }

    // == Length ==
    /// Returns the number of records, referenced or not.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no record.
    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    // == Close ==
    /// Stops the sweep loop.
    ///
    /// Safe to call more than once. The cache stays usable afterwards, but
    /// unreferenced records are no longer reclaimed in the background.
    pub fn close(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Sweep loop shutdown requested");
        }
    }

    /// Returns true once [`close`](WeakCache::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl<V> Drop for WeakCache<V> {
    fn drop(&mut self) {
        self.close();
    }
}
