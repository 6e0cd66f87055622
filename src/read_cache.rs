//! The read cache (RC): a second append-only ring holding copies of cold
//! records fetched from disk, spliced into the same hash-bucket chains the
//! hybrid log uses (spec §4.1/§4.4).
//!
//! Built on the same [`crate::paged_log::PagedLog`] the hybrid log uses, but
//! every address this module hands out or accepts has
//! [`Address::K_READ_CACHE_MASK`] set, so a chain's `PreviousAddress` links
//! (and a [`crate::index::hash_bucket::HashBucketEntry`]'s own
//! `ReadCacheBit`) can tell an RC hop from an HLOG hop without a second
//! lookup. This mirrors the teacher's own reservation of that high bit on
//! `Address`; the teacher's tree never wired a second ring up to it, so the
//! read/write/out-splice protocol here is new.

use crate::core::address::Address;
use crate::paged_log::PagedLog;
use crate::record::{RecordInfo, RecordSlot};
use crate::status::OperationStatus;

pub struct ReadCache<K, V> {
    log: PagedLog<K, V>,
}

impl<K, V> ReadCache<K, V> {
    pub fn new(page_capacity: u32, buffer_pages: u32) -> Self {
        Self {
            log: PagedLog::new(page_capacity, buffer_pages),
        }
    }

    pub fn page_capacity(&self) -> u32 {
        self.log.page_capacity()
    }

    fn tag(address: Address) -> Address {
        Address::from_control(address.control() | Address::K_READ_CACHE_MASK)
    }

    pub fn tail_address(&self) -> Address {
        Self::tag(self.log.tail_address())
    }

    pub fn head_address(&self) -> Address {
        Self::tag(self.log.head_address())
    }

    pub fn read_only_address(&self) -> Address {
        Self::tag(self.log.read_only_address())
    }

    pub fn set_head_address(&self, address: Address) {
        debug_assert!(address.in_readcache());
        self.log.set_head_address(address.readcache_address());
    }

    pub fn set_read_only_address(&self, address: Address) {
        debug_assert!(address.in_readcache());
        self.log
            .set_read_only_address(address.readcache_address());
    }

    /// True if `address` (an RC-tagged address) is still above `HeadAddress`
    /// and safe to dereference via [`ReadCache::get`].
    pub fn is_resident(&self, address: Address) -> bool {
        address.in_readcache() && self.log.is_resident(address.readcache_address())
    }

    /// Appends a cached copy of a cold record, linking it to the chain
    /// element it shadows via `previous`. `previous` may itself be an
    /// RC-tagged address (stacking a fresher copy atop an older one) or a
    /// plain HLOG address (the common case: caching a disk/HLOG-resident
    /// record for the first time). Returns the RC-tagged address the caller
    /// should splice into the hash bucket or a newer record's
    /// `PreviousAddress`.
    pub fn insert(
        &self,
        previous: Address,
        key: K,
        value: V,
    ) -> Result<Address, OperationStatus> {
        let info = RecordInfo::new(previous, 0, false);
        let address = self.log.allocate()?;
        let slot = Box::new(RecordSlot::new(info, key, value));
        self.log.install(address, slot);
        Ok(Self::tag(address))
    }

    /// Dereferences an RC-tagged address. Returns `None` if the address
    /// isn't actually RC-tagged, or if its page has been evicted/recycled.
    pub fn get(&self, address: Address) -> Option<&RecordSlot<K, V>> {
        if !address.in_readcache() {
            return None;
        }
        self.log.get(address.readcache_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_tags_address_and_round_trips() {
        let rc: ReadCache<u64, u64> = ReadCache::new(8, 4);
        let shadowed = Address::new(3, 7);
        let rc_addr = rc.insert(shadowed, 1, 2).unwrap();
        assert!(rc_addr.in_readcache());

        let slot = rc.get(rc_addr).unwrap();
        assert_eq!(slot.key, 1);
        assert_eq!(*slot.value(), 2);
        assert_eq!(slot.info().previous_address(), shadowed);
    }

    #[test]
    fn get_rejects_untagged_address() {
        let rc: ReadCache<u64, u64> = ReadCache::new(8, 4);
        let rc_addr = rc.insert(Address::INVALID_ADDRESS, 1, 2).unwrap();
        let untagged = rc_addr.readcache_address();
        assert!(rc.get(untagged).is_none());
    }

    #[test]
    fn eviction_via_head_address_hides_old_entries() {
        let rc: ReadCache<u64, u64> = ReadCache::new(2, 1);
        let a0 = rc.insert(Address::INVALID_ADDRESS, 10, 10).unwrap();
        let _a1 = rc.insert(Address::INVALID_ADDRESS, 11, 11).unwrap();
        assert!(rc.is_resident(a0));

        let new_head = Address::from_control(
            Address::new(1, 0).control() | Address::K_READ_CACHE_MASK,
        );
        rc.set_head_address(new_head);
        assert!(!rc.is_resident(a0));
    }
}
