//! `FasterKv`: the store engine tying the hash index, hybrid log, read
//! cache, lock table and disk together (spec §4.2-§4.6).
//!
//! Grounded on the shape of the teacher's `rskv::RsKv` (owns an index, a
//! log, a lock/epoch manager, and exposes `get`/`upsert`/`rmw`/`delete`),
//! generalized to the two-ring (HLOG + RC) chain this crate implements and
//! to the explicit lock-transfer protocol spec §4.5 calls for.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::callbacks::RmwCallback;
use crate::config::{Config, ReadFlags};
use crate::core::address::Address;
use crate::device::Disk;
use crate::error::{StoreError, StoreResult};
use crate::eviction;
use crate::hlog::HybridLog;
use crate::index::hash_index::{FindContext, FindResult, HashIndex};
use crate::index::key_hash::KeyHasher;
use crate::lock_table::{LockMode, LockTable};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::read_cache::ReadCache;
use crate::record::RecordInfo;
use crate::record::RecordSlot;
use crate::status::{OperationStatus, Status};

/// Where a chain traversal ended up resolving a key.
enum Located<'a, K, V> {
    Missing,
    ReadCache(&'a RecordSlot<K, V>, Address),
    HLog(&'a RecordSlot<K, V>, Address),
    OnDisk(Address),
}

/// Outcome of walking the on-disk portion of a chain for a specific key.
enum DiskWalkOutcome<V> {
    Found(RecordInfo, V),
    NotFound,
    Retry,
}

pub struct FasterKv<K: Eq + Hash, V, D: Disk> {
    index: HashIndex,
    hasher: KeyHasher,
    hlog: HybridLog<K, V>,
    read_cache: Option<ReadCache<K, V>>,
    disk: D,
    lock_table: LockTable<K>,
    config: Config,
    metrics: Metrics,
    healthy: AtomicBool,
}

impl<K, V, D> FasterKv<K, V, D>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
    D: Disk,
{
    pub fn new(config: Config, disk: D) -> StoreResult<Self> {
        config.validate()?;
        let index = HashIndex::new(config.table_size);
        let hlog = HybridLog::new(config.log.page_capacity(), config.log.pages_in_memory());
        let read_cache = config
            .read_cache
            .map(|rc| ReadCache::new(rc.page_capacity(), rc.pages_in_memory()));
        Ok(Self {
            index,
            hasher: KeyHasher::new(),
            hlog,
            read_cache,
            disk,
            lock_table: LockTable::with_shards(config.lock_table_shards),
            metrics: Metrics::default(),
            config,
            healthy: AtomicBool::new(true),
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// `(BeginAddress, HeadAddress, ReadOnlyAddress, TailAddress)` of the
    /// hybrid log, as of the call. Used by [`crate::checkpoint`] to capture
    /// a point-in-time snapshot of the log's region boundaries.
    pub fn log_addresses(&self) -> (Address, Address, Address, Address) {
        (
            self.hlog.begin_address(),
            self.hlog.head_address(),
            self.hlog.read_only_address(),
            self.hlog.tail_address(),
        )
    }

    pub fn table_size(&self) -> u64 {
        self.config.table_size
    }

    pub fn has_active_locks(&self) -> bool {
        !self.lock_table.is_empty()
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    fn mark_unhealthy(&self) {
        self.healthy.store(false, Ordering::Release);
    }

    fn guard_healthy(&self) -> StoreResult<()> {
        if self.is_healthy() {
            Ok(())
        } else {
            Err(StoreError::StoreUnhealthy)
        }
    }

    /// Flips the health gate on any fatal error passing through, per
    /// `StoreError`'s documented contract.
    fn fallible<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if result.is_err() {
            self.mark_unhealthy();
        }
        result
    }

    /// Normalizes a bucket entry's address into the tagged form a chain's
    /// `PreviousAddress` field expects: `INVALID_ADDRESS` if the slot is
    /// still unused, otherwise the stored address with the read-cache bit
    /// reapplied if the entry is RC-tagged.
    fn chain_head_address(entry: &crate::index::hash_bucket::HashBucketEntry) -> Address {
        if entry.unused() {
            Address::INVALID_ADDRESS
        } else if entry.in_readcache() {
            Address::from_control(entry.address().control() | Address::K_READ_CACHE_MASK)
        } else {
            entry.address()
        }
    }

    /// Walks a chain starting at `ctx.entry`, resolving to the record that
    /// matches `key`, per spec §4.1's RC-then-HLOG chain-traversal order.
    fn resolve_chain<'a>(&'a self, key: &K, ctx: &FindContext) -> Located<'a, K, V> {
        if ctx.entry.unused() {
            return Located::Missing;
        }
        let mut address = Self::chain_head_address(&ctx.entry);
        loop {
            if address == Address::INVALID_ADDRESS {
                return Located::Missing;
            }
            if address.in_readcache() {
                let Some(rc) = &self.read_cache else {
                    return Located::Missing;
                };
                match rc.get(address) {
                    Some(slot) if slot.key == *key && !slot.info().invalid() => {
                        return Located::ReadCache(slot, address);
                    }
                    Some(slot) => {
                        address = slot.info().previous_address();
                        continue;
                    }
                    None => return Located::Missing, // raced an out-splice; caller retries.
                }
            } else {
                match self.hlog.get(address) {
                    Some(slot) if slot.key == *key && !slot.info().invalid() => {
                        return Located::HLog(slot, address);
                    }
                    Some(slot) => {
                        address = slot.info().previous_address();
                        continue;
                    }
                    None => return Located::OnDisk(address),
                }
            }
        }
    }

    fn locate<'a>(&'a self, key: &K) -> (FindContext, Located<'a, K, V>) {
        let hash = self.hasher.hash(key);
        let mut ctx = FindContext::new(hash);
        self.index.find_entry(&mut ctx);
        let located = self.resolve_chain(key, &ctx);
        (ctx, located)
    }

    fn restore_lock_state(&self, key: &K, slot: &RecordSlot<K, V>) {
        if let Some(state) = self.lock_table.take(key) {
            slot.update_lock(|w| {
                let mut next = w;
                if state.exclusive {
                    next = next.with_exclusive(true);
                }
                if state.shared > 0 {
                    next = next.with_shared_delta(state.shared as i32)?;
                }
                Some(next)
            });
            self.metrics.record_lock_transfer_from_table();
        }
    }

    /// Walks from `entry` through any RC prefix to the first true HLOG
    /// address, collecting every live (non-`Invalid`) same-key RC record
    /// crossed along the way. Returns `None` if the walk races an
    /// out-splice, telling the caller to retry the whole operation, same as
    /// `resolve_chain`'s `Located::Missing` on a raced RC lookup.
    fn latest_hlog_and_rc_duplicates(
        &self,
        key: &K,
        entry: &crate::index::hash_bucket::HashBucketEntry,
    ) -> Option<(Address, Vec<Address>)> {
        let mut address = Self::chain_head_address(entry);
        let mut duplicates = Vec::new();
        loop {
            if address == Address::INVALID_ADDRESS || !address.in_readcache() {
                return Some((address, duplicates));
            }
            let rc = self.read_cache.as_ref()?;
            let slot = rc.get(address)?;
            if slot.key == *key && !slot.info().invalid() {
                duplicates.push(address);
            }
            address = slot.info().previous_address();
        }
    }

    /// Marks each of `duplicates` `Invalid`, per spec §4.2/§4.3's splice
    /// rule: once a new record for a key is live, any read-cache copy the
    /// walk passed over must stop shadowing it as current.
    fn invalidate_rc_duplicates(&self, duplicates: &[Address]) {
        let Some(rc) = &self.read_cache else {
            return;
        };
        for &address in duplicates {
            if let Some(slot) = rc.get(address) {
                slot.set_invalid();
            }
        }
    }

    /// True if a live (non-`Invalid`) read-cache record for `key` is already
    /// reachable from `entry`'s RC prefix.
    fn has_live_rc_copy(&self, entry: &crate::index::hash_bucket::HashBucketEntry, key: &K) -> bool {
        let Some(rc) = &self.read_cache else {
            return false;
        };
        let mut address = Self::chain_head_address(entry);
        while address.in_readcache() {
            let Some(slot) = rc.get(address) else {
                return false;
            };
            if slot.key == *key && !slot.info().invalid() {
                return true;
            }
            address = slot.info().previous_address();
        }
        false
    }

    /// Copies a record shadowing `address` into the read cache, if one is
    /// configured, the caller hasn't disabled it, and no live copy for this
    /// key already exists further up the chain — installing a second live
    /// copy would violate the at-most-one-live-record-per-key invariant
    /// (spec §3), so this abandons rather than duplicate.
    fn maybe_cache(&self, ctx: &FindContext, key: K, value: V, address: Address) {
        let Some(rc) = &self.read_cache else {
            return;
        };
        if self.has_live_rc_copy(&ctx.entry, &key) {
            return;
        }
        if let Ok(rc_address) = rc.insert(address, key.clone(), value) {
            if self
                .index
                .try_update_entry(ctx, rc_address.readcache_address(), true)
            {
                self.metrics.record_copied_to_read_cache();
                if let Some(slot) = rc.get(rc_address) {
                    self.restore_lock_state(&key, slot);
                }
            } else if let Some(slot) = rc.get(rc_address) {
                // Lost the splice race; the freshly-inserted slot is
                // unreachable from the bucket head. Mark it Invalid so it
                // can never be mistaken for the live copy if something
                // later re-links a chain through its address.
                slot.set_invalid();
            }
        }
    }

    /// Continues a chain walk across the on-disk portion, following
    /// `PreviousAddress` (with further disk reads, or a resident re-check in
    /// case the record came back into memory) until the search key matches,
    /// the chain ends, or an in-flight update forces the whole operation to
    /// retry (spec §4.1's "tag matches are not key matches" and §4.6's
    /// pending-I/O re-traversal).
    fn resolve_from_disk(&self, key: &K, mut address: Address) -> StoreResult<DiskWalkOutcome<V>> {
        loop {
            if address == Address::INVALID_ADDRESS {
                return Ok(DiskWalkOutcome::NotFound);
            }
            if let Some(slot) = self.hlog.get(address) {
                if slot.lock_word().sealed() {
                    return Ok(DiskWalkOutcome::Retry);
                }
                if slot.key == *key && !slot.info().invalid() {
                    return Ok(DiskWalkOutcome::Found(slot.info(), slot.value().clone()));
                }
                address = slot.info().previous_address();
                continue;
            }
            let (info, fetched_key, value) =
                self.fallible(self.hlog.fetch_from_disk(address, &self.disk))?;
            if fetched_key == *key && !info.invalid() {
                return Ok(DiskWalkOutcome::Found(info, value));
            }
            address = info.previous_address();
        }
    }

    /// Advances `ReadOnlyAddress` to the tail and `HeadAddress` by one page
    /// on both rings, evicting what falls below the new head. Called when
    /// an append hits `AllocateFailed` (spec §4.6).
    fn drive_eviction(&self) -> StoreResult<()> {
        let tail = self.hlog.tail_address();
        self.hlog.set_read_only_address(tail);
        let head = self.hlog.head_address();
        let page_capacity = self.hlog.page_capacity() as u64;
        let head_counter = head.page() as u64 * page_capacity + head.offset() as u64;
        let tail_counter = tail.page() as u64 * page_capacity + tail.offset() as u64;
        let new_head_counter = (head_counter + page_capacity).min(tail_counter);
        if new_head_counter > head_counter {
            let new_head = Address::new(
                (new_head_counter / page_capacity) as u32,
                (new_head_counter % page_capacity) as u32,
            );
            eviction::evict_hlog_below(&self.hlog, &self.lock_table, &self.disk, new_head)?;
            self.metrics.record_hlog_eviction();
        }

        if let Some(rc) = &self.read_cache {
            let rc_page_capacity = self
                .config
                .read_cache
                .map(|c| c.page_capacity())
                .unwrap_or(1) as u64;
            let rc_tail = rc.tail_address().readcache_address();
            let rc_head = rc.head_address().readcache_address();
            let rc_head_counter =
                rc_head.page() as u64 * rc_page_capacity + rc_head.offset() as u64;
            let rc_tail_counter =
                rc_tail.page() as u64 * rc_page_capacity + rc_tail.offset() as u64;
            let rc_new_head_counter = (rc_head_counter + rc_page_capacity).min(rc_tail_counter);
            if rc_new_head_counter > rc_head_counter {
                let rc_new_head = Address::from_control(
                    Address::new(
                        (rc_new_head_counter / rc_page_capacity) as u32,
                        (rc_new_head_counter % rc_page_capacity) as u32,
                    )
                    .control()
                        | Address::K_READ_CACHE_MASK,
                );
                eviction::evict_read_cache_below(rc, &self.index, &self.lock_table, rc_new_head);
                self.metrics.record_read_cache_eviction();
            }
        }
        Ok(())
    }

    /// Caches (or, under `CopyReadsToTail`, appends at the HLOG tail) a copy
    /// of a record just read from `address`, unless the caller disabled it.
    fn maybe_materialize_read(&self, ctx: &FindContext, flags: ReadFlags, key: &K, value: &V, address: Address) {
        if flags.copy_reads_to_tail {
            self.copy_read_to_tail(ctx, key, value.clone());
        } else if !flags.disable_read_cache_updates {
            self.maybe_cache(ctx, key.clone(), value.clone(), address);
        }
    }

    /// Appends a copy of a cold record straight onto the HLOG tail instead
    /// of into the read cache, and invalidates any prior RC copy for the
    /// same key along the chain — the `CopyReadsToTail` read flag (spec
    /// §4.2), for deployments that skip the read cache but still want a hot
    /// copy promoted on access.
    fn copy_read_to_tail(&self, ctx: &FindContext, key: &K, value: V) {
        let Some((latest_hlog, duplicates)) = self.latest_hlog_and_rc_duplicates(key, &ctx.entry) else {
            return;
        };
        let info = RecordInfo::new(latest_hlog, 0, false);
        if let Ok((address, slot)) = self.hlog.append(info, key.clone(), value) {
            if self.index.try_update_entry(ctx, address, false) {
                self.restore_lock_state(key, slot);
                self.invalidate_rc_duplicates(&duplicates);
                self.metrics.record_chain_splice();
            }
        }
    }

    pub fn read(&self, key: &K, flags: ReadFlags) -> StoreResult<(Status, Option<V>)> {
        self.guard_healthy()?;
        self.metrics.record_read();
        for _ in 0..self.config.retry_budget {
            let (ctx, located) = self.locate(key);
            match located {
                Located::Missing => {
                    self.metrics.record_read_cache_miss();
                    return Ok((Status::NotFound, None));
                }
                Located::ReadCache(slot, _address) => {
                    // A sealed record is mid in-place-update; reading its
                    // value here would race the writer (spec §4.1's
                    // `RETRY_NOW`), so retry the whole traversal instead.
                    if slot.lock_word().sealed() {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    self.metrics.record_read_cache_hit();
                    if slot.info().tombstone() {
                        return Ok((Status::NotFound, None));
                    }
                    let value = slot.value().clone();
                    if flags.copy_reads_to_tail {
                        self.copy_read_to_tail(&ctx, key, value.clone());
                    }
                    return Ok((Status::Found, Some(value)));
                }
                Located::HLog(slot, address) => {
                    if slot.lock_word().sealed() {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    if slot.info().tombstone() {
                        return Ok((Status::NotFound, None));
                    }
                    let value = slot.value().clone();
                    if !self.hlog.is_mutable(address) {
                        self.maybe_materialize_read(&ctx, flags, key, &value, address);
                    }
                    return Ok((Status::Found, Some(value)));
                }
                Located::OnDisk(address) => match self.resolve_from_disk(key, address)? {
                    DiskWalkOutcome::Retry => {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    DiskWalkOutcome::NotFound => {
                        self.metrics.record_read_cache_miss();
                        return Ok((Status::NotFound, None));
                    }
                    DiskWalkOutcome::Found(info, value) => {
                        if info.tombstone() {
                            return Ok((Status::NotFound, None));
                        }
                        self.maybe_materialize_read(&ctx, flags, key, &value, address);
                        return Ok((Status::Found, Some(value)));
                    }
                },
            }
        }
        self.metrics.record_aborted_operation();
        Ok((Status::Aborted, None))
    }

    pub fn upsert(&self, key: K, value: V) -> StoreResult<Status> {
        self.guard_healthy()?;
        for _ in 0..self.config.retry_budget {
            let mut ctx = FindContext::new(self.hasher.hash(&key));
            self.index.find_or_create_entry(&mut ctx);
            let Some((previous, duplicates)) = self.latest_hlog_and_rc_duplicates(&key, &ctx.entry)
            else {
                self.metrics.record_internal_retry();
                continue;
            };
            let info = RecordInfo::new(previous, 0, false);
            match self.hlog.append(info, key.clone(), value.clone()) {
                Ok((address, slot)) => {
                    if self.index.try_update_entry(&ctx, address, false) {
                        self.restore_lock_state(&key, slot);
                        self.invalidate_rc_duplicates(&duplicates);
                        self.metrics.record_upsert();
                        self.metrics.record_chain_splice();
                        return Ok(Status::CreatedRecord);
                    }
                    self.metrics.record_splice_cas_failure();
                }
                Err(OperationStatus::AllocateFailed) => self.fallible(self.drive_eviction())?,
                Err(_) => {}
            }
            self.metrics.record_internal_retry();
        }
        self.metrics.record_aborted_operation();
        Ok(Status::Aborted)
    }

    pub fn delete(&self, key: K) -> StoreResult<Status>
    where
        V: Default,
    {
        self.guard_healthy()?;
        for _ in 0..self.config.retry_budget {
            let mut ctx = FindContext::new(self.hasher.hash(&key));
            self.index.find_or_create_entry(&mut ctx);
            let Some((previous, duplicates)) = self.latest_hlog_and_rc_duplicates(&key, &ctx.entry)
            else {
                self.metrics.record_internal_retry();
                continue;
            };
            let info = RecordInfo::new(previous, 0, true);
            match self.hlog.append(info, key.clone(), V::default()) {
                Ok((address, _slot)) => {
                    if self.index.try_update_entry(&ctx, address, false) {
                        self.invalidate_rc_duplicates(&duplicates);
                        self.metrics.record_delete();
                        self.metrics.record_chain_splice();
                        return Ok(Status::CreatedRecord);
                    }
                    self.metrics.record_splice_cas_failure();
                }
                Err(OperationStatus::AllocateFailed) => self.fallible(self.drive_eviction())?,
                Err(_) => {}
            }
            self.metrics.record_internal_retry();
        }
        self.metrics.record_aborted_operation();
        Ok(Status::Aborted)
    }

    /// Appends a copy-updated (or freshly-created) record for `key`,
    /// splicing it in if the chain head hasn't moved. Returns `Ok(None)` to
    /// tell the caller to retry the whole `rmw` from scratch; on success,
    /// reports `on_success` as the operation's `Status`.
    fn append_rmw_result(
        &self,
        key: &K,
        ctx: &FindContext,
        shadow: Address,
        value: V,
        on_success: Status,
    ) -> StoreResult<Option<Status>> {
        let info = RecordInfo::new(shadow, 0, false);
        match self.hlog.append(info, key.clone(), value) {
            Ok((address, slot)) => {
                if self.index.try_update_entry(ctx, address, false) {
                    self.restore_lock_state(key, slot);
                    self.metrics.record_chain_splice();
                    Ok(Some(on_success))
                } else {
                    self.metrics.record_splice_cas_failure();
                    Ok(None)
                }
            }
            Err(OperationStatus::AllocateFailed) => {
                self.fallible(self.drive_eviction())?;
                Ok(None)
            }
            Err(_) => Ok(None),
        }
    }

    /// Read-modify-write: folds `callback` into the current value for
    /// `key`, in place when the chain head is still mutable and otherwise
    /// by appending a copy-updated record (spec §4.3).
    pub fn rmw(&self, key: K, callback: &dyn RmwCallback<V>) -> StoreResult<Status> {
        self.guard_healthy()?;
        self.metrics.record_rmw();
        for _ in 0..self.config.retry_budget {
            let hash = self.hasher.hash(&key);
            let mut ctx = FindContext::new(hash);
            if self.index.find_entry(&mut ctx) == FindResult::NotFound {
                self.index.find_or_create_entry(&mut ctx);
                let value = callback.initial_update();
                match self.append_rmw_result(
                    &key,
                    &ctx,
                    Address::INVALID_ADDRESS,
                    value,
                    Status::CreatedRecord,
                )? {
                    Some(status) => return Ok(status),
                    None => {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                }
            }

            let Some((latest_hlog, duplicates)) = self.latest_hlog_and_rc_duplicates(&key, &ctx.entry)
            else {
                self.metrics.record_internal_retry();
                continue;
            };
            let located = self.resolve_chain(&key, &ctx);
            match located {
                Located::HLog(slot, address)
                    if self.hlog.is_mutable(address) && !slot.info().tombstone() =>
                {
                    let sealed = slot.update_lock(|w| {
                        if w.is_locked() {
                            None
                        } else {
                            Some(w.with_sealed(true).with_exclusive(true))
                        }
                    });
                    if sealed.is_some() {
                        let mut applied = false;
                        unsafe {
                            slot.with_value_mut(|v| applied = callback.in_place_update(v));
                        }
                        slot.update_lock(|w| {
                            Some(w.with_sealed(false).with_exclusive(false).with_modified(true))
                        });
                        if applied {
                            self.metrics.record_in_place_update();
                            return Ok(Status::InPlaceUpdated);
                        }
                    } else if slot.lock_word().sealed() {
                        // Another writer is mid in-place-update; reading the
                        // value now would race it (spec §4.1's `RETRY_NOW`).
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    let new_value = callback.copy_update(slot.value());
                    if let Some(status) = self.append_rmw_result(
                        &key,
                        &ctx,
                        latest_hlog,
                        new_value,
                        Status::CopyUpdated,
                    )? {
                        self.invalidate_rc_duplicates(&duplicates);
                        return Ok(status);
                    }
                }
                Located::HLog(slot, _address) if !slot.info().tombstone() => {
                    if slot.lock_word().sealed() {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    let new_value = callback.copy_update(slot.value());
                    if let Some(status) = self.append_rmw_result(
                        &key,
                        &ctx,
                        latest_hlog,
                        new_value,
                        Status::CopyUpdated,
                    )? {
                        self.invalidate_rc_duplicates(&duplicates);
                        return Ok(status);
                    }
                }
                Located::ReadCache(slot, _address) if !slot.info().tombstone() => {
                    if slot.lock_word().sealed() {
                        self.metrics.record_internal_retry();
                        continue;
                    }
                    let new_value = callback.copy_update(slot.value());
                    if let Some(status) = self.append_rmw_result(
                        &key,
                        &ctx,
                        latest_hlog,
                        new_value,
                        Status::CopyUpdated,
                    )? {
                        self.invalidate_rc_duplicates(&duplicates);
                        return Ok(status);
                    }
                }
                Located::OnDisk(address) => match self.resolve_from_disk(&key, address)? {
                    DiskWalkOutcome::Retry => {}
                    DiskWalkOutcome::NotFound => {
                        let new_value = callback.initial_update();
                        if let Some(status) = self.append_rmw_result(
                            &key,
                            &ctx,
                            latest_hlog,
                            new_value,
                            Status::CreatedRecord,
                        )? {
                            self.invalidate_rc_duplicates(&duplicates);
                            return Ok(status);
                        }
                    }
                    DiskWalkOutcome::Found(info, old_value) => {
                        let (new_value, on_success) = if info.tombstone() {
                            (callback.initial_update(), Status::CreatedRecord)
                        } else {
                            (callback.copy_update(&old_value), Status::CopyUpdated)
                        };
                        if let Some(status) = self.append_rmw_result(
                            &key,
                            &ctx,
                            latest_hlog,
                            new_value,
                            on_success,
                        )? {
                            self.invalidate_rc_duplicates(&duplicates);
                            return Ok(status);
                        }
                    }
                },
                _ => {
                    // Tombstoned or raced-away record: treat the key as
                    // absent and create a fresh one.
                    let new_value = callback.initial_update();
                    if let Some(status) = self.append_rmw_result(
                        &key,
                        &ctx,
                        latest_hlog,
                        new_value,
                        Status::CreatedRecord,
                    )? {
                        self.invalidate_rc_duplicates(&duplicates);
                        return Ok(status);
                    }
                }
            }
            self.metrics.record_internal_retry();
        }
        self.metrics.record_aborted_operation();
        Ok(Status::Aborted)
    }

    /// Acquires `mode` on `key`, against whichever location currently holds
    /// its lock state: an in-memory record's `LockWord`, or the overflow
    /// lock table if the key is cold (spec §4.5).
    pub fn lock(&self, key: &K, mode: LockMode) -> bool {
        let (_ctx, located) = self.locate(key);
        match located {
            Located::ReadCache(slot, _) | Located::HLog(slot, _) => slot
                .update_lock(|w| match mode {
                    LockMode::Shared if !w.exclusive() => w.with_shared_delta(1),
                    LockMode::Exclusive if !w.is_locked() => Some(w.with_exclusive(true)),
                    _ => None,
                })
                .is_some(),
            Located::Missing | Located::OnDisk(_) => self.lock_table.try_lock(key, mode),
        }
    }

    pub fn unlock(&self, key: &K, mode: LockMode) -> bool {
        let (_ctx, located) = self.locate(key);
        match located {
            Located::ReadCache(slot, _) | Located::HLog(slot, _) => slot
                .update_lock(|w| match mode {
                    LockMode::Shared if w.shared_count() > 0 => w.with_shared_delta(-1),
                    LockMode::Exclusive if w.exclusive() => Some(w.with_exclusive(false)),
                    _ => None,
                })
                .is_some(),
            Located::Missing | Located::OnDisk(_) => self.lock_table.unlock(key, mode),
        }
    }
}
