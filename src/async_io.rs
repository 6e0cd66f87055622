//! Pending I/O bookkeeping for operations that hit `RecordOnDisk` (spec
//! §4.6).
//!
//! The teacher's tree never got as far as wiring a real async I/O
//! completion path (`core::async_context` is a lone, never-instantiated
//! struct). Spec §1 explicitly scopes out a production async I/O engine, so
//! rather than fabricate a completion-port/io_uring style reactor, pending
//! operations here are simply queued and resolved synchronously the next
//! time a session calls `complete_pending` — "pending" means "deferred to a
//! drain point", not "non-blocking".

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::address::Address;
use crate::callbacks::RmwCallback;

/// What to do once the disk fetch for a pending operation completes.
pub enum PendingKind<V> {
    /// A `Read` that missed memory; the caller just wants the value.
    Read,
    /// An `Rmw` that missed memory; apply the callback to the fetched value
    /// (or treat the key as absent if the disk read itself reports
    /// not-found) and append the result.
    Rmw(Box<dyn RmwCallback<V> + Send>),
    /// A `Delete` against a key whose latest record is on disk; the tail
    /// tombstone still needs appending once the chain's shape is confirmed.
    Delete,
}

pub struct PendingRequest<K, V> {
    pub key: K,
    pub address: Address,
    pub kind: PendingKind<V>,
}

/// A FIFO of operations waiting on a disk fetch. One instance per session,
/// matching the teacher's per-thread `PendingContext` ownership rather than
/// a store-wide queue, so completions never cross session boundaries.
pub struct PendingIoTable<K, V> {
    queue: Mutex<VecDeque<PendingRequest<K, V>>>,
}

impl<K, V> PendingIoTable<K, V> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }

    pub fn enqueue(&self, request: PendingRequest<K, V>) {
        self.queue.lock().unwrap().push_back(request);
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pops every currently-queued request for the caller to resolve.
    /// Requests enqueued by a resolution callback mid-drain (an `Rmw` that
    /// turns out to also need a second fetch) wait for the next call.
    pub fn drain(&self) -> Vec<PendingRequest<K, V>> {
        let mut queue = self.queue.lock().unwrap();
        queue.drain(..).collect()
    }
}

impl<K, V> Default for PendingIoTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_then_drain_returns_in_order() {
        let table: PendingIoTable<u64, u64> = PendingIoTable::new();
        table.enqueue(PendingRequest {
            key: 1,
            address: Address::new(0, 1),
            kind: PendingKind::Read,
        });
        table.enqueue(PendingRequest {
            key: 2,
            address: Address::new(0, 2),
            kind: PendingKind::Delete,
        });
        assert_eq!(table.len(), 2);
        let drained = table.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].key, 1);
        assert_eq!(drained[1].key, 2);
        assert!(table.is_empty());
    }
}
