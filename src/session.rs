//! Per-caller session handle: binds a thread/task to the store, scopes an
//! epoch guard around each call, and owns the deferred-I/O queue a caller
//! opts into for explicit pending-completion workflows (spec §4.6/§6).
//!
//! The teacher never wires `core::async_context`'s `AsyncIOContext` up to
//! anything; this module is grounded instead on `core::light_epoch::
//! LightEpoch::protect`'s per-call guard pattern and on
//! `core::lockable_record`'s guard-scoped access shape for `lock`/`unlock`,
//! adapted from a record-local guard to a session-local one.

use crate::async_io::{PendingIoTable, PendingKind, PendingRequest};
use crate::config::ReadFlags;
use crate::core::address::Address;
use crate::core::light_epoch::LightEpoch;
use crate::device::Disk;
use crate::engine::FasterKv;
use crate::error::StoreResult;
use crate::lock_table::LockMode;
use crate::status::Status;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Outcome of draining one queued [`PendingRequest`].
pub enum PendingOutcome<V> {
    Read(StoreResult<(Status, Option<V>)>),
    Rmw(StoreResult<Status>),
    Delete(StoreResult<Status>),
}

/// A bound handle to a [`FasterKv`] instance. Every call pins a fresh epoch
/// guard for its own duration rather than holding one for the session's
/// whole lifetime, so a long-lived session never stalls background
/// reclamation the way holding a single guard across many calls would.
pub struct Session<'a, K: Eq + Hash, V, D: Disk> {
    store: &'a FasterKv<K, V, D>,
    epoch: LightEpoch,
    pending: PendingIoTable<K, V>,
}

impl<'a, K, V, D> Session<'a, K, V, D>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
    D: Disk,
{
    pub fn new(store: &'a FasterKv<K, V, D>) -> Self {
        Self {
            store,
            epoch: LightEpoch::new(),
            pending: PendingIoTable::new(),
        }
    }

    pub fn read(&self, key: &K, flags: ReadFlags) -> StoreResult<(Status, Option<V>)> {
        let _guard = self.epoch.protect();
        self.store.read(key, flags)
    }

    pub fn upsert(&self, key: K, value: V) -> StoreResult<Status> {
        let _guard = self.epoch.protect();
        self.store.upsert(key, value)
    }

    pub fn rmw(&self, key: K, callback: &dyn crate::callbacks::RmwCallback<V>) -> StoreResult<Status> {
        let _guard = self.epoch.protect();
        self.store.rmw(key, callback)
    }

    pub fn delete(&self, key: K) -> StoreResult<Status>
    where
        V: Default,
    {
        let _guard = self.epoch.protect();
        self.store.delete(key)
    }

    pub fn lock(&self, key: &K, mode: LockMode) -> bool {
        let _guard = self.epoch.protect();
        self.store.lock(key, mode)
    }

    pub fn unlock(&self, key: &K, mode: LockMode) -> bool {
        let _guard = self.epoch.protect();
        self.store.unlock(key, mode)
    }

    /// Queues a request for later resolution via [`Session::complete_pending`]
    /// instead of resolving it inline. Useful for a caller batching several
    /// operations before paying the cost of draining them, e.g. a network
    /// server amortizing the drain over one epoch refresh per tick rather
    /// than one per request.
    pub fn enqueue_pending(&self, key: K, address: Address, kind: PendingKind<V>) {
        self.pending.enqueue(PendingRequest { key, address, kind });
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Resolves every currently-queued request against the store, pairing
    /// each with the key it was issued for. Requests enqueued by a callback
    /// mid-drain wait for the next call, matching
    /// [`PendingIoTable::drain`]'s own contract.
    pub fn complete_pending(&self) -> Vec<(K, PendingOutcome<V>)>
    where
        V: Default,
    {
        let _guard = self.epoch.protect();
        self.pending
            .drain()
            .into_iter()
            .map(|request| {
                let PendingRequest { key, kind, .. } = request;
                let outcome = match kind {
                    PendingKind::Read => {
                        PendingOutcome::Read(self.store.read(&key, ReadFlags::default()))
                    }
                    PendingKind::Rmw(callback) => {
                        PendingOutcome::Rmw(self.store.rmw(key.clone(), callback.as_ref()))
                    }
                    PendingKind::Delete => PendingOutcome::Delete(self.store.delete(key.clone())),
                };
                (key, outcome)
            })
            .collect()
    }
}
