//! Key Hasher Module
//!
//! Maps string keys to the numeric index used by the record maps, and
//! provides the passthrough hasher those maps are keyed with.

use std::fmt;
use std::hash::{BuildHasher, Hasher};

use ahash::RandomState;

// == Key Hasher ==
/// Seeded key hasher.
///
/// The seed is drawn once per instance, so indices are stable for the
/// lifetime of one cache but not comparable across caches or processes.
#[derive(Clone, Default)]
pub(crate) struct KeyHasher {
    state: RandomState,
}

impl KeyHasher {
    /// Creates a hasher with a fresh random seed.
    pub fn new() -> Self {
        Self {
            state: RandomState::new(),
        }
    }

    /// Returns the index for `key`.
    pub fn index(&self, key: &str) -> u64 {
        self.state.hash_one(key)
    }
}

impl fmt::Debug for KeyHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHasher").finish_non_exhaustive()
    }
}

// == Passthrough Hasher ==
/// Hasher for indices that are already seeded hashes.
#[derive(Default)]
pub(crate) struct PassthroughHasher(u64);

impl Hasher for PassthroughHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _bytes: &[u8]) {
        panic!("PassthroughHasher only works with u64 indices");
    }

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

/// Build hasher for maps keyed by [`KeyHasher::index`] output.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PassthroughBuildHasher;

impl BuildHasher for PassthroughBuildHasher {
    type Hasher = PassthroughHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PassthroughHasher::default()
    }
}
