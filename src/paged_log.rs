//! Generic, page-structured, append-only ring shared by the hybrid log and
//! the read cache.
//!
//! Grounded on `hlog::persistent_memory_malloc::PersistentMemoryMalloc`'s
//! shape: a fixed-capacity circular array of pages, a reservation-based tail
//! allocator, and Head/ReadOnly/Begin address bookkeeping. It departs from
//! that module in one load-bearing way: the teacher's allocator hands out
//! raw byte ranges for `Sized + Copy` records; this one hands out *slots*,
//! each holding a heap-boxed [`crate::record::RecordSlot`]. Keys and values
//! here are arbitrary owned Rust values (`Vec<u8>`, `String`, structs...),
//! not C-struct-layout-compatible types, so slot-indexed pages take the
//! place of byte-indexed ones. `page_capacity` plays the role the teacher's
//! fixed `K_PAGE_SIZE` (`Address::K_MAX_OFFSET + 1`) plays, just
//! configurable per log instead of baked into the address type.

use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use crate::core::address::Address;
use crate::record::RecordSlot;
use crate::status::OperationStatus;

struct PageEntry<K, V> {
    logical_page: u64,
    slots: Box<[AtomicPtr<RecordSlot<K, V>>]>,
}

/// A page-structured ring of record slots, addressed by logical [`Address`].
///
/// Physical page slots are reused circularly (`logical_page %
/// buffer_pages`); a page is only safe to recycle once `HeadAddress` has
/// advanced past every slot address it holds, which is the caller's
/// (`crate::hlog`/`crate::read_cache`) responsibility to guarantee before
/// calling `allocate` again for a wrapped-around page number.
pub struct PagedLog<K, V> {
    page_capacity: u32,
    buffer_pages: u32,
    physical: Box<[AtomicPtr<PageEntry<K, V>>]>,
    install_lock: Mutex<()>,

    tail: AtomicU64,
    head: AtomicU64,
    read_only: AtomicU64,
    begin: AtomicU64,
}

impl<K, V> PagedLog<K, V> {
    pub fn new(page_capacity: u32, buffer_pages: u32) -> Self {
        assert!(page_capacity > 0 && buffer_pages > 0);
        let physical = (0..buffer_pages)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            page_capacity,
            buffer_pages,
            physical,
            install_lock: Mutex::new(()),
            tail: AtomicU64::new(0),
            head: AtomicU64::new(0),
            read_only: AtomicU64::new(0),
            begin: AtomicU64::new(0),
        }
    }

    pub fn page_capacity(&self) -> u32 {
        self.page_capacity
    }

    fn counter_of(&self, address: Address) -> u64 {
        address.page() as u64 * self.page_capacity as u64 + address.offset() as u64
    }

    fn address_of(&self, counter: u64) -> Address {
        let page = counter / self.page_capacity as u64;
        let offset = counter % self.page_capacity as u64;
        Address::new(page as u32, offset as u32)
    }

    pub fn tail_address(&self) -> Address {
        self.address_of(self.tail.load(Ordering::Acquire))
    }

    pub fn head_address(&self) -> Address {
        self.address_of(self.head.load(Ordering::Acquire))
    }

    pub fn read_only_address(&self) -> Address {
        self.address_of(self.read_only.load(Ordering::Acquire))
    }

    pub fn begin_address(&self) -> Address {
        self.address_of(self.begin.load(Ordering::Acquire))
    }

    pub fn set_read_only_address(&self, address: Address) {
        self.read_only.store(self.counter_of(address), Ordering::Release);
    }

    pub fn set_head_address(&self, address: Address) {
        self.head.store(self.counter_of(address), Ordering::Release);
    }

    pub fn set_begin_address(&self, address: Address) {
        self.begin.store(self.counter_of(address), Ordering::Release);
    }

    pub fn is_mutable(&self, address: Address) -> bool {
        self.counter_of(address) >= self.read_only.load(Ordering::Acquire)
    }

    pub fn is_resident(&self, address: Address) -> bool {
        self.counter_of(address) >= self.head.load(Ordering::Acquire)
    }

    /// Reserves one slot at the tail, installing its page if this is the
    /// first reservation to land there. Returns `AllocateFailed` (spec
    /// §4.6) if the tail would run more than `buffer_pages` ahead of
    /// `HeadAddress` — the caller should drive eviction and retry.
    pub fn allocate(&self) -> Result<Address, OperationStatus> {
        let counter = self.tail.fetch_add(1, Ordering::AcqRel);
        let page = counter / self.page_capacity as u64;
        let head_page = self.head.load(Ordering::Acquire) / self.page_capacity as u64;
        if page.saturating_sub(head_page) >= self.buffer_pages as u64 {
            return Err(OperationStatus::AllocateFailed);
        }
        self.ensure_page(page);
        Ok(self.address_of(counter))
    }

    fn ensure_page(&self, page: u64) {
        let phys = (page % self.buffer_pages as u64) as usize;
        let current = self.physical[phys].load(Ordering::Acquire);
        if !current.is_null() && unsafe { (*current).logical_page } == page {
            return;
        }
        let _guard = self.install_lock.lock().unwrap();
        let current = self.physical[phys].load(Ordering::Acquire);
        if !current.is_null() && unsafe { (*current).logical_page } == page {
            return;
        }
        let slots = (0..self.page_capacity)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let new_entry = Box::into_raw(Box::new(PageEntry {
            logical_page: page,
            slots,
        }));
        let old = self.physical[phys].swap(new_entry, Ordering::AcqRel);
        if !old.is_null() {
            let guard = crossbeam_epoch::pin();
            unsafe {
                guard.defer_unchecked(move || {
                    let old_box = Box::from_raw(old);
                    for slot in old_box.slots.iter() {
                        let p = slot.swap(ptr::null_mut(), Ordering::AcqRel);
                        if !p.is_null() {
                            drop(Box::from_raw(p));
                        }
                    }
                });
            }
        }
    }

    /// Publishes a boxed record into a previously-`allocate`d slot.
    pub fn install(&self, address: Address, slot: Box<RecordSlot<K, V>>) -> &RecordSlot<K, V> {
        let page = address.page() as u64;
        let phys = (page % self.buffer_pages as u64) as usize;
        let entry = self.physical[phys].load(Ordering::Acquire);
        debug_assert!(!entry.is_null());
        debug_assert_eq!(unsafe { (*entry).logical_page }, page);
        let ptr = Box::into_raw(slot);
        unsafe { (*entry).slots[address.offset() as usize].store(ptr, Ordering::Release) };
        unsafe { &*ptr }
    }

    /// Dereferences `address`, returning `None` if the page has already been
    /// recycled for a later logical page (the caller should treat this the
    /// same as a not-yet-resolved address below `HeadAddress`).
    pub fn get(&self, address: Address) -> Option<&RecordSlot<K, V>> {
        let page = address.page() as u64;
        let phys = (page % self.buffer_pages as u64) as usize;
        let entry = self.physical[phys].load(Ordering::Acquire);
        if entry.is_null() || unsafe { (*entry).logical_page } != page {
            return None;
        }
        let ptr = unsafe { (*entry).slots[address.offset() as usize].load(Ordering::Acquire) };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { &*ptr })
    }
}

impl<K, V> Drop for PagedLog<K, V> {
    fn drop(&mut self) {
        for slot in self.physical.iter() {
            let entry = slot.load(Ordering::Acquire);
            if entry.is_null() {
                continue;
            }
            unsafe {
                let boxed = Box::from_raw(entry);
                for s in boxed.slots.iter() {
                    let p = s.load(Ordering::Relaxed);
                    if !p.is_null() {
                        drop(Box::from_raw(p));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordInfo;

    #[test]
    fn allocate_install_and_get_round_trips() {
        let log: PagedLog<u64, u64> = PagedLog::new(4, 4);
        let addr = log.allocate().unwrap();
        let slot = Box::new(RecordSlot::new(
            RecordInfo::new(Address::INVALID_ADDRESS, 0, false),
            1u64,
            2u64,
        ));
        log.install(addr, slot);
        let got = log.get(addr).unwrap();
        assert_eq!(got.key, 1);
        assert_eq!(*got.value(), 2);
    }

    #[test]
    fn allocate_respects_buffer_pages_backpressure() {
        let log: PagedLog<u64, u64> = PagedLog::new(2, 1);
        // Fill the one resident page.
        let a0 = log.allocate().unwrap();
        let a1 = log.allocate().unwrap();
        assert_eq!(a0.page(), 0);
        assert_eq!(a1.page(), 0);
        // A third allocation spills into page 1, which can't coexist with
        // page 0 in a 1-page-deep buffer until head advances.
        let result = log.allocate();
        assert!(result.is_err());
    }

    #[test]
    fn page_recycle_after_head_advances() {
        let log: PagedLog<u64, u64> = PagedLog::new(2, 1);
        let a0 = log.allocate().unwrap();
        let a1 = log.allocate().unwrap();
        for (i, a) in [a0, a1].into_iter().enumerate() {
            log.install(
                a,
                Box::new(RecordSlot::new(
                    RecordInfo::new(Address::INVALID_ADDRESS, 0, false),
                    i as u64,
                    i as u64,
                )),
            );
        }
        // Advance head past page 0 entirely, freeing it for reuse.
        log.set_head_address(Address::new(1, 0));
        let a2 = log.allocate().unwrap();
        assert_eq!(a2.page(), 1);
        log.install(
            a2,
            Box::new(RecordSlot::new(
                RecordInfo::new(Address::INVALID_ADDRESS, 0, false),
                99,
                99,
            )),
        );
        assert!(log.get(a0).is_none());
        assert_eq!(log.get(a2).unwrap().key, 99);
    }
}
