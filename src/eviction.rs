//! Background eviction: advances `HeadAddress` on the read cache and the
//! hybrid log, out-splicing evicted read-cache entries and transferring
//! their lock state into the lock table (spec §4.4/§4.5).
//!
//! The teacher's tree never wired a read cache up to its `HashIndex`, so
//! there's no direct ancestor for `evict_read_cache_below`; it's grounded on
//! `index::mem_index::MemHashIndex::find_entry`'s chain-walk shape (iterate
//! bucket slots and their overflow chain) plus `HybridLog::shift_head_address`
//! for the "advance head, then reclaim" ordering.

use std::hash::Hash;

use crate::core::address::Address;
use crate::hlog::HybridLog;
use crate::index::hash_bucket::HashBucketEntry;
use crate::index::hash_index::HashIndex;
use crate::lock_table::LockTable;
use crate::read_cache::ReadCache;

/// Sweeps every hash-bucket entry that points into the read cache below
/// `new_head`, out-splicing it (spec §4.4: "RC eviction rewrites the bucket
/// entry to the shadowed record's `PreviousAddress`, preserving that
/// record's own `ReadCacheBit`") and merging any lock state the evicted
/// record held into `locks` (spec §4.5). Only then advances `HeadAddress`,
/// so a concurrent reader that raced the sweep still finds a resident
/// record either way.
pub fn evict_read_cache_below<K, V>(
    rc: &ReadCache<K, V>,
    index: &HashIndex,
    locks: &LockTable<K>,
    new_head: Address,
) where
    K: Eq + Hash + Clone,
{
    let old_head_plain = rc.head_address().readcache_address();
    let new_head_plain = new_head.readcache_address();

    // Step 1: out-splice every bucket entry that points directly into the
    // evicted range, transferring lock state first.
    index.for_each_entry(|_bucket_idx, slot| loop {
        let entry = slot.load();
        if entry.unused() || !entry.in_readcache() {
            return;
        }
        if entry.address() >= new_head_plain {
            return; // still resident after the upcoming head advance.
        }
        let tagged = Address::from_control(entry.address().control() | Address::K_READ_CACHE_MASK);
        let Some(record) = rc.get(tagged) else {
            // Already recycled by a racing sweep; nothing left to transfer.
            return;
        };
        let lock = record.lock_word();
        if lock.is_locked() {
            locks.merge_from_record(&record.key, lock.exclusive(), lock.shared_count());
        }
        let bypass = bypass_evicted_chain(
            rc,
            record.info().previous_address(),
            old_head_plain,
            new_head_plain,
        );
        let replacement =
            HashBucketEntry::new(bypass.readcache_address(), entry.tag(), false, bypass.in_readcache());
        if slot.compare_exchange(entry, replacement).is_ok() {
            return;
        }
        // Lost the race (another out-splice or a fresh upsert moved the
        // chain head); reload and retry against the new state.
    });

    // Step 2: a record isn't always first in its chain. Any still-resident
    // RC record whose own `PreviousAddress` points into the evicted range
    // has that predecessor as an interior link, not a bucket head, so step 1
    // never touches it. Walk every resident record above the new head and
    // rewrite its link to bypass the evicted predecessor(s) directly.
    let page_capacity = rc.page_capacity() as u64;
    let mut counter =
        new_head_plain.page() as u64 * page_capacity + new_head_plain.offset() as u64;
    let tail_plain = rc.tail_address().readcache_address();
    let end = tail_plain.page() as u64 * page_capacity + tail_plain.offset() as u64;
    while counter < end {
        let plain_address = Address::new(
            (counter / page_capacity) as u32,
            (counter % page_capacity) as u32,
        );
        let tagged = Address::from_control(plain_address.control() | Address::K_READ_CACHE_MASK);
        if let Some(record) = rc.get(tagged) {
            loop {
                let current = record.info();
                let previous = current.previous_address();
                if !previous.in_readcache() {
                    break;
                }
                let previous_plain = previous.readcache_address();
                if !(previous_plain >= old_head_plain && previous_plain < new_head_plain) {
                    break;
                }
                let bypass = bypass_evicted_chain(rc, previous, old_head_plain, new_head_plain);
                if record
                    .compare_exchange_info(current, current.with_previous_address(bypass))
                    .is_ok()
                {
                    break;
                }
                // Lost the race against a concurrent update to this same
                // record; reload and retry against the fresh info word.
            }
        }
        counter += 1;
    }

    rc.set_head_address(new_head);
}

/// Follows `address`'s own `PreviousAddress` chain while it keeps pointing
/// into `[old_head, new_head)` — the range about to be reclaimed — returning
/// the first address it finds outside that range (an HLOG address, or a
/// still-resident RC address below `new_head`'s own predecessor chain has
/// nowhere left to retreat to, an invalid address).
fn bypass_evicted_chain<K, V>(
    rc: &ReadCache<K, V>,
    mut address: Address,
    old_head: Address,
    new_head: Address,
) -> Address {
    while address.in_readcache() {
        let plain = address.readcache_address();
        if !(plain >= old_head && plain < new_head) {
            return address;
        }
        let Some(record) = rc.get(address) else {
            return Address::INVALID_ADDRESS;
        };
        address = record.info().previous_address();
    }
    address
}

/// Evicts every hybrid-log record between the current `HeadAddress` and
/// `new_head` to `disk`, then advances `HeadAddress`. Unlike the read
/// cache, an evicted HLOG record isn't dropped: it becomes the
/// `RecordOnDisk` fallback for any chain that still references it. Any lock
/// state the record held is merged into `locks` first, the same
/// lock-transfer step `evict_read_cache_below` performs (spec §4.5).
pub fn evict_hlog_below<K, V>(
    hlog: &HybridLog<K, V>,
    locks: &LockTable<K>,
    disk: &dyn crate::device::Disk,
    new_head: Address,
) -> crate::error::StoreResult<()>
where
    K: Eq + Hash + Clone + serde::Serialize,
    V: Clone + serde::Serialize,
{
    let old_head = hlog.head_address();
    if new_head <= old_head {
        return Ok(());
    }
    let page_capacity = hlog.page_capacity();
    let mut counter = old_head.page() as u64 * page_capacity as u64 + old_head.offset() as u64;
    let end = new_head.page() as u64 * page_capacity as u64 + new_head.offset() as u64;
    while counter < end {
        let address = Address::new(
            (counter / page_capacity as u64) as u32,
            (counter % page_capacity as u64) as u32,
        );
        if let Some(record) = hlog.get(address) {
            let lock = record.lock_word();
            if lock.is_locked() {
                locks.merge_from_record(&record.key, lock.exclusive(), lock.shared_count());
            }
            hlog.evict_to_disk(address, disk)?;
        }
        counter += 1;
    }
    hlog.set_head_address(new_head);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::key_hash::KeyHasher;
    use crate::record::RecordInfo;

    #[test]
    fn evict_read_cache_out_splices_and_transfers_locks() {
        let index = HashIndex::new(16);
        let rc: ReadCache<u64, u64> = ReadCache::new(4, 1);
        let locks: LockTable<u64> = LockTable::with_shards(4);
        let hasher = KeyHasher::with_seed([1, 2, 3, 4]);

        let key = 42u64;
        let hash = hasher.hash(&key);
        let mut ctx = crate::index::hash_index::FindContext::new(hash);
        index.find_or_create_entry(&mut ctx);

        let hlog_address = Address::new(0, 5);
        let rc_address = rc.insert(hlog_address, key, 100u64).unwrap();
        assert!(index.try_update_entry(&ctx, rc_address.readcache_address(), true));

        let slot = rc.get(rc_address).unwrap();
        slot.update_lock(|w| w.with_shared_delta(1)).unwrap();

        let new_head = Address::from_control(
            Address::new(1, 0).control() | Address::K_READ_CACHE_MASK,
        );
        evict_read_cache_below(&rc, &index, &locks, new_head);

        let mut lookup = crate::index::hash_index::FindContext::new(hash);
        assert_eq!(
            index.find_entry(&mut lookup),
            crate::index::hash_index::FindResult::Found
        );
        assert_eq!(lookup.entry.address(), hlog_address);
        assert!(!lookup.entry.in_readcache());

        let transferred = locks.take(&key).unwrap();
        assert_eq!(transferred.shared, 1);
    }

    #[test]
    fn evict_read_cache_repairs_interior_previous_address_links() {
        let index = HashIndex::new(16);
        let rc: ReadCache<u64, u64> = ReadCache::new(1, 2);
        let locks: LockTable<u64> = LockTable::with_shards(4);
        let hasher = KeyHasher::with_seed([5, 6, 7, 8]);

        let key = 7u64;
        let hash = hasher.hash(&key);
        let mut ctx = crate::index::hash_index::FindContext::new(hash);
        index.find_or_create_entry(&mut ctx);

        // `r1` lands on page 0, `r2` stacks on top of it and lands on page 1
        // (page_capacity 1 forces a new page per insert). Only `r2` is
        // spliced into the bucket; `r1` is reachable solely via `r2`'s own
        // `PreviousAddress`.
        let hlog_address = Address::new(0, 3);
        let r1 = rc.insert(hlog_address, key, 10u64).unwrap();
        let r2 = rc.insert(r1, key, 20u64).unwrap();
        assert!(index.try_update_entry(&ctx, r2.readcache_address(), true));

        let new_head =
            Address::from_control(Address::new(1, 0).control() | Address::K_READ_CACHE_MASK);
        evict_read_cache_below(&rc, &index, &locks, new_head);

        // `r1`'s page is gone, but `r2` survives and its link must now skip
        // straight to the hlog address `r1` used to shadow.
        let r2_record = rc.get(r2).unwrap();
        assert_eq!(r2_record.info().previous_address(), hlog_address);
    }

    #[test]
    fn evict_hlog_transfers_locked_record_state() {
        let hlog: HybridLog<u64, u64> = HybridLog::new(4, 4);
        let locks: LockTable<u64> = LockTable::with_shards(4);
        let info = RecordInfo::new(Address::INVALID_ADDRESS, 0, false);
        let (address, slot) = hlog.append(info, 7u64, 99u64).unwrap();
        slot.update_lock(|w| Some(w.with_exclusive(true))).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let disk = crate::device::FileSystemDisk::new(dir.path().to_str().unwrap()).unwrap();
        let new_head = Address::new(address.page(), address.offset() + 1);
        evict_hlog_below(&hlog, &locks, &disk, new_head).unwrap();

        let transferred = locks.take(&7u64).unwrap();
        assert!(transferred.exclusive);
    }
}
