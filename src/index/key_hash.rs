//! Key hashing: turns an arbitrary hashable key into the `(table_index,
//! tag)` pair a hash bucket needs.
//!
//! The teacher hashes with a hand-rolled `FasterHash` (`core::utility`).
//! This crate instead hashes keys through `ahash`, keyed by a seed chosen
//! when the index is built (spec §4.1: "ahash, keyed by session build-time
//! seed") — the same production-grade keyed hash other crates in the pack
//! reach for instead of a bespoke multiplicative hash.

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;

/// A raw 64-bit key hash, before it's split into table index + tag.
#[derive(Clone, Copy, Debug)]
pub struct KeyHash(u64);

impl KeyHash {
    const TAG_BITS: u32 = 14;
    const TAG_MASK: u64 = (1 << Self::TAG_BITS) - 1;

    pub fn new(hash: u64) -> Self {
        Self(hash)
    }

    pub fn control(&self) -> u64 {
        self.0
    }

    /// Truncates the hash to get the index into a hash table of a given
    /// (power-of-two) size.
    #[inline]
    pub fn table_index(&self, table_size: u64) -> u64 {
        debug_assert!(crate::core::utility::is_power_of_two(table_size));
        self.0 & (table_size - 1)
    }

    /// The tag serves as a cheap discriminator inside a hash bucket,
    /// consistent with `HashBucketEntry`'s bit layout.
    #[inline]
    pub fn tag(&self) -> u16 {
        (self.0 >> 48) as u16 & Self::TAG_MASK as u16
    }
}

/// Builds [`KeyHash`] values for a specific hash index instance. Each index
/// gets its own randomly-seeded `ahash` state so that an adversarial key
/// distribution against one store instance doesn't transfer to another.
pub struct KeyHasher {
    state: RandomState,
}

impl KeyHasher {
    pub fn new() -> Self {
        Self {
            state: RandomState::new(),
        }
    }

    pub fn with_seed(seeds: [u64; 4]) -> Self {
        Self {
            state: RandomState::with_seeds(seeds[0], seeds[1], seeds[2], seeds[3]),
        }
    }

    pub fn hash<K: Hash + ?Sized>(&self, key: &K) -> KeyHash {
        let mut hasher = self.state.build_hasher();
        key.hash(&mut hasher);
        KeyHash::new(hasher.finish())
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}
