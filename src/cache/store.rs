//! Record Store Module
//!
//! Dual-map storage engine: records with live handles sit in the reachable
//! map, unreferenced records wait in the unreachable map until they are
//! reactivated by a fetch or reclaimed once expired.
//!
//! The store holds no lock and reads no clock. Callers serialize access and
//! pass the current time in, which keeps every transition testable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::hasher::PassthroughBuildHasher;
use crate::cache::{CacheStats, Record};

/// Map keyed by precomputed key indices
type RecordMap<V> = HashMap<u64, Record<V>, PassthroughBuildHasher>;

// == Acquired Reference ==
/// A reference handed out by [`RecordStore::acquire`].
#[derive(Debug)]
pub(crate) struct Acquired<V> {
    /// The record's value
    pub value: Arc<V>,
    /// Generation of the record the reference belongs to
    pub generation: u64,
}

// == Release Outcome ==
/// Result of releasing a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
    /// The record was evicted or replaced while the reference was alive
    Stale,
    /// Other references remain; carries the new count
    Referenced(usize),
    /// The last reference was released and the record became unreachable
    Unreferenced,
}

// == Record Store ==
/// Reference-counted record storage keyed by hashed index.
#[derive(Debug)]
pub(crate) struct RecordStore<V> {
    /// Records with at least one live reference
    reachable: RecordMap<V>,
    /// Records with no live reference
    unreachable: RecordMap<V>,
    /// Generation assigned to the next created record
    next_generation: u64,
    /// Activity counters
    stats: CacheStats,
}

impl<V> Default for RecordStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecordStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            reachable: HashMap::with_hasher(PassthroughBuildHasher),
            unreachable: HashMap::with_hasher(PassthroughBuildHasher),
            next_generation: 1,
            stats: CacheStats::new(),
        }
    }

    // == Acquire ==
    /// Gets or creates the record for `key` and takes a reference to it.
    ///
    /// A live record is reused, reactivating it if it was unreferenced.
    /// Otherwise `producer` is called; if it fails its error is returned and
    /// no record is created.
    ///
    /// # Arguments
    /// * `index` - Hashed index of `key`
    /// * `key` - The key being fetched
    /// * `min_ttl` - Grace period for a newly created record
    /// * `max_ttl` - Maximum age for a newly created record, zero = unbounded
    /// * `now` - Current time
    /// * `producer` - Computes the value on a miss
    pub fn acquire<F, E>(
        &mut self,
        index: u64,
        key: &str,
        min_ttl: Duration,
        max_ttl: Duration,
        now: Instant,
        producer: F,
    ) -> Result<Acquired<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut record = match self.take_live(index, key, now) {
            Some(record) => record,
            None => {
                self.stats.record_miss();
                let value = match producer() {
                    Ok(value) => value,
                    Err(err) => {
                        self.stats.record_producer_error();
                        debug!(key, "Producer failed, no record created");
                        return Err(err);
                    }
                };
                self.displace(index, key);

                let generation = self.next_generation;
                self.next_generation += 1;
                debug!(key, generation, "Created record");
                Record::new(key, value, min_ttl, max_ttl, now, generation)
            }
        };

        record.refs += 1;
        let acquired = Acquired {
            value: Arc::clone(&record.value),
            generation: record.generation,
        };
        self.reachable.insert(index, record);

        Ok(acquired)
    }

    // == Retain ==
    /// Takes an additional reference to a record that is already referenced.
    ///
    /// Returns false if the record of that generation is gone.
    pub fn retain(&mut self, index: u64, generation: u64) -> bool {
        match self.reachable.get_mut(&index) {
            Some(record) if record.generation == generation => {
                record.refs += 1;
                true
            }
            _ => false,
        }
    }

    // == Release ==
    /// Drops one reference to the record of `generation` at `index`.
    ///
    /// When the count reaches zero the record moves to the unreachable map
    /// and its grace period starts at `now`.
    pub fn release(&mut self, index: u64, generation: u64, now: Instant) -> Release {
        let remaining = match self.reachable.get_mut(&index) {
            Some(record) if record.generation == generation => {
                record.refs = record.refs.saturating_sub(1);
                record.refs
            }
            _ => return Release::Stale,
        };

        if remaining > 0 {
            return Release::Referenced(remaining);
        }

        match self.reachable.remove(&index) {
            Some(mut record) => {
                record.last_unref = Some(now);
                self.unreachable.insert(index, record);
                Release::Unreferenced
            }
            None => Release::Stale,
        }
    }

    // == Sweep ==
    /// Removes every expired unreachable record.
    ///
    /// Reachable records are left alone; they are only expired lazily by
    /// [`RecordStore::acquire`].
    ///
    /// Returns the number of records removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.unreachable.len();
        self.unreachable.retain(|_, record| !record.is_expired(now));
        let removed = before - self.unreachable.len();

        self.stats.record_evictions(removed);
        removed
    }

    // == Length ==
    /// Returns the number of records in both maps.
    pub fn len(&self) -> usize {
        self.reachable.len() + self.unreachable.len()
    }

    // == Is Empty ==
    /// Returns true if no record is held.
    pub fn is_empty(&self) -> bool {
        self.reachable.is_empty() && self.unreachable.is_empty()
    }

    // == Stats ==
    /// Returns current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.reachable_entries = self.reachable.len();
        stats.unreachable_entries = self.unreachable.len();
        stats
    }

    /// Removes the record at `index` if it is live and cached under `key`.
    ///
    /// Expired records are discarded. A record stored under a different key
    /// that hashed to the same index is left in place and reported as a miss.
    fn take_live(&mut self, index: u64, key: &str, now: Instant) -> Option<Record<V>> {
        let (map, reactivated) = if self.unreachable.contains_key(&index) {
            (&mut self.unreachable, true)
        } else if self.reachable.contains_key(&index) {
            (&mut self.reachable, false)
        } else {
            return None;
        };

        let record = map.get(&index)?;
        if record.is_expired(now) {
            map.remove(&index);
            self.stats.record_evictions(1);
            debug!(key, reactivated, "Discarded expired record on fetch");
            return None;
        }
        if record.key() != key {
            return None;
        }

        let mut record = map.remove(&index)?;
        record.last_unref = None;
        self.stats.record_hit(reactivated);
        debug!(key, reactivated, "Record hit");
        Some(record)
    }

    /// Drops a record of another key occupying `index`.
    fn displace(&mut self, index: u64, key: &str) {
        let displaced = self
            .reachable
            .remove(&index)
            .or_else(|| self.unreachable.remove(&index));

        if let Some(record) = displaced {
            warn!(
                key,
                displaced = %record.key,
                "Key index collision, replacing existing record"
            );
        }
    }

    /// Checks the structural invariants of both maps.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        for (index, record) in &self.reachable {
            if record.refs == 0 {
                return Err(format!("reachable record {index} has no references"));
            }
            if record.last_unref.is_some() {
                return Err(format!("reachable record {index} has an unreference time"));
            }
            if self.unreachable.contains_key(index) {
                return Err(format!("index {index} is present in both maps"));
            }
        }
        for (index, record) in &self.unreachable {
            if record.refs != 0 {
                return Err(format!("unreachable record {index} is still referenced"));
            }
            if record.last_unref.is_none() {
                return Err(format!("unreachable record {index} has no unreference time"));
            }
        }
        Ok(())
    }

    /// Reference count of the record at `index`, if any.
    #[cfg(test)]
    pub(crate) fn refs(&self, index: u64) -> Option<usize> {
        self.reachable
            .get(&index)
            .or_else(|| self.unreachable.get(&index))
            .map(Record::refs)
    }
}
