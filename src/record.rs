//! Record headers and the record slot stored in every page of a
//! [`crate::paged_log::PagedLog`].
//!
//! The specification's `RecordInfo` lists `PreviousAddress`,
//! `CheckpointVersion`, `Invalid`, `Tombstone`, `Sealed`, `ExclusiveLock`,
//! `SharedLockCount` and `Modified` together, but those fields add up to 73
//! bits — more than one 64-bit word holds. The teacher already draws exactly
//! this seam: `core::record::RecordInfo` (link + version + tombstone bits)
//! is one control word, and `core::locking::RecordLock` (exclusive/shared
//! lock state) is a second, CAS'd independently. This module keeps that
//! split and extends each half with the bits the specification adds:
//! [`RecordInfo`] stays link/version/invalid/tombstone, and [`LockWord`]
//! gains `Sealed`/`Modified` alongside the teacher's exclusive/shared bits.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::address::Address;

/// Link + checkpoint-version + tombstone control word. Bit-compatible with
/// the teacher's `core::record::RecordInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct RecordInfo(u64);

impl RecordInfo {
    pub const PREVIOUS_ADDRESS_BITS: u32 = 48;
    pub const CHECKPOINT_VERSION_BITS: u32 = 13;
    pub const INVALID_BIT: u32 = 1;
    pub const TOMBSTONE_BIT: u32 = 1;

    pub const PREVIOUS_ADDRESS_MASK: u64 = (1 << Self::PREVIOUS_ADDRESS_BITS) - 1;
    pub const CHECKPOINT_VERSION_MASK: u64 = (1 << Self::CHECKPOINT_VERSION_BITS) - 1;

    pub const CHECKPOINT_VERSION_SHIFT: u32 = Self::PREVIOUS_ADDRESS_BITS;
    pub const INVALID_SHIFT: u32 = Self::PREVIOUS_ADDRESS_BITS + Self::CHECKPOINT_VERSION_BITS;
    pub const TOMBSTONE_SHIFT: u32 = Self::INVALID_SHIFT + Self::INVALID_BIT;

    pub fn new(previous_address: Address, checkpoint_version: u16, tombstone: bool) -> Self {
        let mut control = previous_address.control();
        control |= (checkpoint_version as u64 & Self::CHECKPOINT_VERSION_MASK)
            << Self::CHECKPOINT_VERSION_SHIFT;
        if tombstone {
            control |= 1 << Self::TOMBSTONE_SHIFT;
        }
        RecordInfo(control)
    }

    pub fn from_control(control: u64) -> Self {
        RecordInfo(control)
    }

    pub fn control(&self) -> u64 {
        self.0
    }

    pub fn previous_address(&self) -> Address {
        Address::from_control(self.0 & Self::PREVIOUS_ADDRESS_MASK)
    }

    pub fn with_previous_address(&self, address: Address) -> Self {
        RecordInfo((self.0 & !Self::PREVIOUS_ADDRESS_MASK) | address.control())
    }

    pub fn checkpoint_version(&self) -> u16 {
        ((self.0 >> Self::CHECKPOINT_VERSION_SHIFT) & Self::CHECKPOINT_VERSION_MASK) as u16
    }

    pub fn invalid(&self) -> bool {
        ((self.0 >> Self::INVALID_SHIFT) & 1) != 0
    }

    pub fn with_invalid(&self, invalid: bool) -> Self {
        if invalid {
            RecordInfo(self.0 | (1 << Self::INVALID_SHIFT))
        } else {
            RecordInfo(self.0 & !(1 << Self::INVALID_SHIFT))
        }
    }

    pub fn tombstone(&self) -> bool {
        ((self.0 >> Self::TOMBSTONE_SHIFT) & 1) != 0
    }
}

/// Sealed/ExclusiveLock/SharedLockCount/Modified, CAS'd independently of
/// [`RecordInfo`]. Extends the teacher's `core::locking::RecordLock` bit
/// layout (`shared_count:32`, `exclusive:1`) with the two extra bits the
/// specification requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct LockWord(u64);

impl LockWord {
    const SHARED_COUNT_BITS: u32 = 32;
    const SHARED_COUNT_MASK: u64 = (1 << Self::SHARED_COUNT_BITS) - 1;
    const EXCLUSIVE_SHIFT: u32 = Self::SHARED_COUNT_BITS;
    const SEALED_SHIFT: u32 = Self::EXCLUSIVE_SHIFT + 1;
    const MODIFIED_SHIFT: u32 = Self::SEALED_SHIFT + 1;

    pub fn control(&self) -> u64 {
        self.0
    }

    pub fn from_control(control: u64) -> Self {
        LockWord(control)
    }

    pub fn shared_count(&self) -> u32 {
        (self.0 & Self::SHARED_COUNT_MASK) as u32
    }

    pub fn exclusive(&self) -> bool {
        ((self.0 >> Self::EXCLUSIVE_SHIFT) & 1) != 0
    }

    pub fn sealed(&self) -> bool {
        ((self.0 >> Self::SEALED_SHIFT) & 1) != 0
    }

    pub fn modified(&self) -> bool {
        ((self.0 >> Self::MODIFIED_SHIFT) & 1) != 0
    }

    pub fn with_sealed(&self, sealed: bool) -> Self {
        if sealed {
            LockWord(self.0 | (1 << Self::SEALED_SHIFT))
        } else {
            LockWord(self.0 & !(1 << Self::SEALED_SHIFT))
        }
    }

    pub fn with_modified(&self, modified: bool) -> Self {
        if modified {
            LockWord(self.0 | (1 << Self::MODIFIED_SHIFT))
        } else {
            LockWord(self.0 & !(1 << Self::MODIFIED_SHIFT))
        }
    }

    pub fn with_shared_delta(&self, delta: i32) -> Option<Self> {
        let current = self.shared_count() as i64;
        let next = current + delta as i64;
        if next < 0 || next > Self::SHARED_COUNT_MASK as i64 {
            return None;
        }
        Some(LockWord((self.0 & !Self::SHARED_COUNT_MASK) | next as u64))
    }

    pub fn with_exclusive(&self, exclusive: bool) -> Self {
        if exclusive {
            LockWord(self.0 | (1 << Self::EXCLUSIVE_SHIFT))
        } else {
            LockWord(self.0 & !(1 << Self::EXCLUSIVE_SHIFT))
        }
    }

    pub fn is_locked(&self) -> bool {
        self.exclusive() || self.shared_count() > 0
    }
}

/// Atomically-accessed pair of control words plus an owned key/value.
///
/// Lives behind an `AtomicPtr` in a [`crate::paged_log::PagedLog`] page; the
/// page owns the slot's allocation and frees it once the epoch guarantees no
/// reader still holds a reference. `key` never changes after construction
/// and is a plain field; `value` can be updated in place by an `Rmw` and is
/// held behind an `UnsafeCell` for that reason — see [`RecordSlot::value`]
/// and [`RecordSlot::with_value_mut`] for the invariant that makes that
/// sound.
pub struct RecordSlot<K, V> {
    info: AtomicU64,
    lock: AtomicU64,
    pub key: K,
    value: UnsafeCell<V>,
}

// SAFETY: all concurrent access to `value` goes through `value()` (shared
// read) or `with_value_mut()` (exclusive write, gated on the caller already
// holding `lock`'s exclusive bit per spec's single-writer/multi-reader
// record-locking protocol). No two threads ever hold a `&mut V` at once, and
// a reader never observes a torn write because writers seal the record
// (`LockWord::sealed`) before mutating and unseal it after.
unsafe impl<K: Sync, V: Send> Sync for RecordSlot<K, V> {}

impl<K, V> RecordSlot<K, V> {
    pub fn new(info: RecordInfo, key: K, value: V) -> Self {
        Self {
            info: AtomicU64::new(info.control()),
            lock: AtomicU64::new(0),
            key,
            value: UnsafeCell::new(value),
        }
    }

    /// Reads the current value. Safe as long as no concurrent
    /// `with_value_mut` call is in flight, which holding (or observing)
    /// `lock_word().sealed()` before calling this is meant to guarantee.
    pub fn value(&self) -> &V {
        unsafe { &*self.value.get() }
    }

    /// Mutates the value in place. The caller must already hold the
    /// record's exclusive lock (`lock_word().exclusive()`) and must have
    /// sealed the record, so no concurrent reader or writer observes a
    /// partial update.
    ///
    /// # Safety
    /// Calling this without holding the exclusive lock races with any
    /// concurrent reader of `value()`.
    pub unsafe fn with_value_mut(&self, f: impl FnOnce(&mut V)) {
        f(unsafe { &mut *self.value.get() })
    }

    pub fn info(&self) -> RecordInfo {
        RecordInfo::from_control(self.info.load(Ordering::Acquire))
    }

    pub fn lock_word(&self) -> LockWord {
        LockWord::from_control(self.lock.load(Ordering::Acquire))
    }

    pub fn compare_exchange_info(
        &self,
        current: RecordInfo,
        new: RecordInfo,
    ) -> Result<RecordInfo, RecordInfo> {
        self.info
            .compare_exchange(
                current.control(),
                new.control(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(RecordInfo::from_control)
            .map_err(RecordInfo::from_control)
    }

    pub fn compare_exchange_lock(
        &self,
        current: LockWord,
        new: LockWord,
    ) -> Result<LockWord, LockWord> {
        self.lock
            .compare_exchange(
                current.control(),
                new.control(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(LockWord::from_control)
            .map_err(LockWord::from_control)
    }

    /// Spin-CAS helper: applies `f` to the current lock word and retries the
    /// CAS until it succeeds or `f` declines to produce a next value.
    pub fn update_lock(&self, mut f: impl FnMut(LockWord) -> Option<LockWord>) -> Option<LockWord> {
        loop {
            let current = self.lock_word();
            let next = f(current)?;
            if self.compare_exchange_lock(current, next).is_ok() {
                return Some(next);
            }
        }
    }

    pub fn set_invalid(&self) {
        loop {
            let current = self.info();
            if current.invalid() {
                return;
            }
            if self
                .compare_exchange_info(current, current.with_invalid(true))
                .is_ok()
            {
                return;
            }
        }
    }
}
