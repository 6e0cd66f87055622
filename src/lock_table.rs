//! The lock table (LT): an overflow map holding lock state for keys whose
//! record has been evicted from memory (spec §4.5).
//!
//! Grounded on `core::locking::RecordLock`'s single-writer/multi-reader,
//! CAS-or-fail semantics, but keyed by `K` instead of embedded in a record
//! header, using `dashmap::DashMap` for the per-bucket sharded latch spec §5
//! calls for ("LT per-bucket sharded DashMap latch held only for a single
//! lock-state mutation duration").

use dashmap::DashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    pub exclusive: bool,
    pub shared: u32,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        self.exclusive || self.shared > 0
    }
}

pub struct LockTable<K: Eq + Hash> {
    entries: DashMap<K, LockState, ahash::RandomState>,
}

impl<K: Eq + Hash + Clone> LockTable<K> {
    pub fn with_shards(_shards: usize) -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Attempts to acquire `mode` on `key`. Fails outright (no queuing) if
    /// the request conflicts with an existing holder, mirroring
    /// `RecordLock::try_lock_*`'s CAS-or-fail semantics.
    pub fn try_lock(&self, key: &K, mode: LockMode) -> bool {
        let mut entry = self.entries.entry(key.clone()).or_default();
        match mode {
            LockMode::Shared => {
                if entry.exclusive {
                    false
                } else {
                    entry.shared += 1;
                    true
                }
            }
            LockMode::Exclusive => {
                if entry.is_locked() {
                    false
                } else {
                    entry.exclusive = true;
                    true
                }
            }
        }
    }

    /// Releases `mode` on `key`. Returns `false` if the lock wasn't held.
    /// Removes the entry entirely once its count returns to zero, so an
    /// unlocked key leaves no trace in the table.
    pub fn unlock(&self, key: &K, mode: LockMode) -> bool {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return false;
        };
        let ok = match mode {
            LockMode::Shared => {
                if entry.shared == 0 {
                    false
                } else {
                    entry.shared -= 1;
                    true
                }
            }
            LockMode::Exclusive => {
                if !entry.exclusive {
                    false
                } else {
                    entry.exclusive = false;
                    true
                }
            }
        };
        let empty = !entry.is_locked();
        drop(entry);
        if empty {
            self.entries.remove(key);
        }
        ok
    }

    pub fn try_get(&self, key: &K) -> Option<LockState> {
        self.entries.get(key).map(|e| *e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges lock state evicted from an in-memory record into the table
    /// (spec §4.5: "lock state copied from RC record header to LT entry").
    /// Adds to any state already present for the key rather than
    /// overwriting it, since a lock can be re-evicted more than once before
    /// it's fully released.
    pub fn merge_from_record(&self, key: &K, exclusive: bool, shared: u32) {
        if !exclusive && shared == 0 {
            return;
        }
        let mut entry = self.entries.entry(key.clone()).or_default();
        entry.exclusive |= exclusive;
        entry.shared += shared;
    }

    /// Removes and returns the full lock state for `key`, for transfer back
    /// into a freshly-published in-memory record (spec §4.5's LT -> RC/HLOG
    /// restore path). Leaves no entry behind.
    pub fn take(&self, key: &K) -> Option<LockState> {
        self.entries.remove(key).map(|(_, v)| v)
    }
}
