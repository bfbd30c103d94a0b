//! Cache Record Module
//!
//! Defines the reference-counted unit stored by the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

// == Record ==
/// A cached value together with its reference count and expiry metadata.
#[derive(Debug)]
pub(crate) struct Record<V> {
    /// Original key, checked on lookup to detect index collisions
    pub(crate) key: Box<str>,
    /// The stored value, shared with every handle issued for this record
    pub(crate) value: Arc<V>,
    /// Grace period after the last handle is released
    pub(crate) min_ttl: Duration,
    /// Absolute expiry, None = never expires by age
    pub(crate) expires_at: Option<Instant>,
    /// Number of live handles
    pub(crate) refs: usize,
    /// When `refs` last dropped to zero
    pub(crate) last_unref: Option<Instant>,
    /// Distinguishes this record from any later record under the same index
    pub(crate) generation: u64,
}

impl<V> Record<V> {
    // == Constructor ==
    /// Creates an unreferenced record.
    ///
    /// # Arguments
    /// * `key` - The key the record is cached under
    /// * `value` - The produced value
    /// * `min_ttl` - Grace period once unreferenced
    /// * `max_ttl` - Maximum age, zero disables age expiry
    /// * `now` - Creation time
    /// * `generation` - Unique id within the owning store
    pub fn new(
        key: &str,
        value: V,
        min_ttl: Duration,
        max_ttl: Duration,
        now: Instant,
        generation: u64,
    ) -> Self {
        let expires_at = if max_ttl > Duration::ZERO {
            now.checked_add(max_ttl)
        } else {
            None
        };

        Self {
            key: key.into(),
            value: Arc::new(value),
            min_ttl,
            expires_at,
            refs: 0,
            last_unref: None,
            generation,
        }
    }

    // == Is Expired ==
    /// Checks whether the record is no longer usable at `now`.
    ///
    /// A record expires once its grace period has elapsed since it was last
    /// unreferenced, or once its absolute expiry has passed. Both comparisons
    /// are strict: a record is still valid at exactly its deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        let grace_elapsed = self
            .last_unref
            .and_then(|at| at.checked_add(self.min_ttl))
            .is_some_and(|deadline| deadline < now);

        grace_elapsed || self.expires_at.is_some_and(|expires| expires < now)
    }

    /// The key this record was created for.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The cached value.
    #[cfg(test)]
    pub fn value(&self) -> &Arc<V> {
        &self.value
    }

    /// Current number of live handles.
    #[cfg(test)]
    pub fn refs(&self) -> usize {
        self.refs
    }

    /// Absolute expiry, if any.
    #[cfg(test)]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Time the record last became unreferenced, if it is unreferenced.
    #[cfg(test)]
    pub fn last_unref(&self) -> Option<Instant> {
        self.last_unref
    }
}
