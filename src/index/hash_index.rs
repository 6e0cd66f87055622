//! The hash index: a fixed-size bucket table plus an overflow-bucket
//! allocator, implementing `find_entry` / `find_or_create_entry` /
//! `try_update_entry` (spec §4.1).
//!
//! Generalized from the teacher's `index::mem_index::MemHashIndex` /
//! `HotLogMemHashIndex`: the teacher keeps two table versions around for an
//! in-progress grow phase. This crate doesn't implement table resizing (see
//! DESIGN.md's Open Questions), so there's a single active table rather than
//! a `[InternalHashTable; 2]` pair.

use crate::core::address::Address;
use crate::core::malloc_fixed_page_size::MallocFixedPageSize;
use crate::index::hash_bucket::{
    AtomicHashBucketEntry, HashBucketEntry, HashBucketOverflowEntry, HotLogIndexHashBucket,
};
use crate::index::key_hash::KeyHash;

pub type HashBucket = HotLogIndexHashBucket;

/// Outcome of `find_entry`/`find_or_create_entry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResult {
    Found,
    NotFound,
}

/// Carries the located (or newly-claimed) bucket slot between a find and a
/// subsequent `try_update_entry` CAS.
pub struct FindContext {
    pub key_hash: KeyHash,
    pub entry: HashBucketEntry,
    atomic_entry: Option<*const AtomicHashBucketEntry>,
}

// `atomic_entry` points into a bucket owned by `HashIndex`'s `buckets` array
// or into a `MallocFixedPageSize`-allocated overflow bucket, both of which
// outlive any single operation's `FindContext`. The raw pointer exists only
// to avoid threading a lifetime through every caller; nothing is ever freed
// out from under it (overflow buckets, once linked in, are never unlinked).
unsafe impl Send for FindContext {}

impl FindContext {
    pub fn new(key_hash: KeyHash) -> Self {
        Self {
            key_hash,
            entry: HashBucketEntry::default(),
            atomic_entry: None,
        }
    }
}

/// The hash index proper: a resident bucket array sized at construction
/// time, with a chained overflow-bucket allocator for buckets that outgrow
/// their 7 inline slots.
pub struct HashIndex {
    buckets: Box<[HashBucket]>,
    table_size: u64,
    overflow: MallocFixedPageSize<HashBucket>,
}

impl HashIndex {
    pub fn new(table_size: u64) -> Self {
        assert!(
            crate::core::utility::is_power_of_two(table_size),
            "hash index table_size must be a power of two"
        );
        let buckets = (0..table_size)
            .map(|_| HashBucket::default())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let mut overflow = MallocFixedPageSize::new();
        overflow.initialize(crate::core::constants::K_CACHE_LINE_BYTES);
        Self {
            buckets,
            table_size,
            overflow,
        }
    }

    pub fn table_size(&self) -> u64 {
        self.table_size
    }

    fn bucket(&self, idx: u64) -> &HashBucket {
        &self.buckets[idx as usize]
    }

    /// Looks up the chain head for `key_hash`. On `FindResult::Found`,
    /// `context.entry` holds the current bucket entry.
    pub fn find_entry(&self, context: &mut FindContext) -> FindResult {
        let tag = context.key_hash.tag();
        let bucket_idx = context.key_hash.table_index(self.table_size);
        let mut bucket = self.bucket(bucket_idx);

        loop {
            for slot in bucket.entries.iter() {
                let entry = slot.load();
                if !entry.unused() && entry.tag() == tag && !entry.tentative() {
                    context.entry = entry;
                    context.atomic_entry = Some(slot as *const AtomicHashBucketEntry);
                    return FindResult::Found;
                }
            }
            let overflow_entry = bucket.overflow_entry.load();
            if overflow_entry.unused() {
                break;
            }
            bucket = self.overflow.get(overflow_entry.address());
        }

        context.entry = HashBucketEntry::default();
        context.atomic_entry = None;
        FindResult::NotFound
    }

    /// Finds an existing entry or claims a fresh (tentative) slot for one,
    /// per spec §4.1's claim/verify/finalize protocol. Returns the bucket
    /// index the caller can pass to `has_conflicting_entry` on retry.
    pub fn find_or_create_entry(&self, context: &mut FindContext) {
        let tag = context.key_hash.tag();
        let bucket_idx = context.key_hash.table_index(self.table_size);

        loop {
            self.find_tentative_entry(context, bucket_idx);

            let Some(atomic_entry_ptr) = context.atomic_entry else {
                // Chain was full and a fresh overflow bucket lost the CAS
                // race; retry the whole lookup.
                continue;
            };
            let atomic_entry = unsafe { &*atomic_entry_ptr };

            if !context.entry.unused() {
                return; // Found a live, non-tentative match.
            }

            let desired = HashBucketEntry::new(Address::INVALID_ADDRESS, tag, true, false);
            if atomic_entry
                .compare_exchange(HashBucketEntry::default(), desired)
                .is_ok()
            {
                if self.has_conflicting_entry(bucket_idx, tag) {
                    // Someone else claimed a matching tag before us released
                    // the slot and retry the whole lookup.
                    atomic_entry.store(HashBucketEntry::default());
                    continue;
                }
                let finalized = HashBucketEntry::new(Address::INVALID_ADDRESS, tag, false, false);
                atomic_entry.store(finalized);
                context.entry = finalized;
                return;
            }
            // Lost the claim race; retry.
        }
    }

    /// Splices a new chain head into the bucket entry `context` observed,
    /// single CAS, per spec §4.2/§4.3.
    pub fn try_update_entry(
        &self,
        context: &FindContext,
        new_address: Address,
        readcache: bool,
    ) -> bool {
        let Some(atomic_entry_ptr) = context.atomic_entry else {
            return false;
        };
        let atomic_entry = unsafe { &*atomic_entry_ptr };
        let tag = context.key_hash.tag();
        let new_entry = HashBucketEntry::new(new_address, tag, false, readcache);
        atomic_entry
            .compare_exchange(context.entry, new_entry)
            .is_ok()
    }

    /// Atomically replaces a specific bucket-entry slot, used by read-cache
    /// eviction's out-splice (spec §4.4) where the slot to rewrite is known
    /// up front rather than discovered via a fresh `find_entry`.
    pub fn compare_exchange_slot(
        &self,
        bucket_idx: u64,
        slot_idx: usize,
        current: HashBucketEntry,
        new: HashBucketEntry,
    ) -> Result<HashBucketEntry, HashBucketEntry> {
        self.bucket(bucket_idx).entries[slot_idx].compare_exchange(current, new)
    }

    /// Iterates every live (non-unused) bucket-entry slot across the main
    /// table and its overflow chains, invoking `f(bucket_idx, slot_atomic)`.
    /// Used by the read-cache evictor's out-splice sweep.
    pub fn for_each_entry(&self, mut f: impl FnMut(u64, &AtomicHashBucketEntry)) {
        for bucket_idx in 0..self.table_size {
            let mut bucket = self.bucket(bucket_idx);
            loop {
                for slot in bucket.entries.iter() {
                    if !slot.load().unused() {
                        f(bucket_idx, slot);
                    }
                }
                let overflow_entry = bucket.overflow_entry.load();
                if overflow_entry.unused() {
                    break;
                }
                bucket = self.overflow.get(overflow_entry.address());
            }
        }
    }

    fn find_tentative_entry(&self, context: &mut FindContext, bucket_idx: u64) {
        let tag = context.key_hash.tag();
        let mut bucket = self.bucket(bucket_idx);
        let mut free_slot: Option<*const AtomicHashBucketEntry> = None;

        loop {
            for slot in bucket.entries.iter() {
                let entry = slot.load();
                if entry.unused() {
                    if free_slot.is_none() {
                        free_slot = Some(slot as *const AtomicHashBucketEntry);
                    }
                    continue;
                }
                if entry.tag() == tag && !entry.tentative() {
                    context.entry = entry;
                    context.atomic_entry = Some(slot as *const AtomicHashBucketEntry);
                    return;
                }
            }

            let overflow_entry = bucket.overflow_entry.load();
            if overflow_entry.unused() {
                if let Some(slot) = free_slot {
                    context.entry = HashBucketEntry::default();
                    context.atomic_entry = Some(slot);
                } else {
                    let new_bucket_addr = self.overflow.allocate();
                    let new_bucket = self.overflow.get(new_bucket_addr);
                    let new_overflow_entry = HashBucketOverflowEntry::new(new_bucket_addr);
                    if bucket
                        .overflow_entry
                        .compare_exchange(HashBucketOverflowEntry::default(), new_overflow_entry)
                        .is_ok()
                    {
                        context.entry = HashBucketEntry::default();
                        context.atomic_entry = Some(&new_bucket.entries[0]);
                    } else {
                        let guard = crossbeam_epoch::pin();
                        self.overflow.free_at_epoch(new_bucket_addr, &guard);
                        context.atomic_entry = None;
                    }
                }
                return;
            }
            bucket = self.overflow.get(overflow_entry.address());
        }
    }

    fn has_conflicting_entry(&self, bucket_idx: u64, tag: u16) -> bool {
        let mut bucket = self.bucket(bucket_idx);
        loop {
            for slot in bucket.entries.iter() {
                let entry = slot.load();
                if !entry.unused() && entry.tag() == tag && !entry.tentative() {
                    return true;
                }
            }
            let overflow_entry = bucket.overflow_entry.load();
            if overflow_entry.unused() {
                return false;
            }
            bucket = self.overflow.get(overflow_entry.address());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::key_hash::KeyHasher;

    #[test]
    fn find_or_create_then_find_round_trips() {
        let index = HashIndex::new(16);
        let hasher = KeyHasher::with_seed([1, 2, 3, 4]);
        let hash = hasher.hash(&42u64);

        let mut ctx = FindContext::new(hash);
        index.find_or_create_entry(&mut ctx);
        assert!(ctx.entry.unused() || ctx.entry.address() == Address::INVALID_ADDRESS);

        let addr = Address::new(0, 5);
        assert!(index.try_update_entry(&ctx, addr, false));

        let mut lookup = FindContext::new(hash);
        assert_eq!(index.find_entry(&mut lookup), FindResult::Found);
        assert_eq!(lookup.entry.address(), addr);
    }

    #[test]
    fn find_entry_on_empty_index_is_not_found() {
        let index = HashIndex::new(16);
        let hasher = KeyHasher::with_seed([9, 9, 9, 9]);
        let mut ctx = FindContext::new(hasher.hash(&"missing"));
        assert_eq!(index.find_entry(&mut ctx), FindResult::NotFound);
    }

    #[test]
    fn overflow_chain_handles_many_colliding_tags() {
        // Force collisions into the same bucket by using a 1-bucket table.
        let index = HashIndex::new(1);
        let hasher = KeyHasher::with_seed([1, 1, 1, 1]);
        for i in 0..50u64 {
            let hash = hasher.hash(&i);
            let mut ctx = FindContext::new(hash);
            index.find_or_create_entry(&mut ctx);
            assert!(index.try_update_entry(&ctx, Address::new(0, i as u32 + 1), false));
        }
        for i in 0..50u64 {
            let hash = hasher.hash(&i);
            let mut ctx = FindContext::new(hash);
            // Tag collisions across different keys are possible but rare
            // enough with ahash that this is a meaningful smoke test.
            let _ = index.find_entry(&mut ctx);
        }
    }
}
