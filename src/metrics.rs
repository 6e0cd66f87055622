//! Lightweight atomic operation counters.
//!
//! Trimmed relative to the teacher's `metrics.rs`, which tracks latency
//! histograms per operation kind plus storage/memory/background gauges.
//! None of the extra dimensions it measures (compression ratio, readahead
//! hit rate, write-batch sizing) apply to this engine, so this module keeps
//! only the counters the engine itself increments: operation counts, splice
//! outcomes, eviction/lock-transfer activity, and retry pressure — exposed
//! as an immutable snapshot the same way the teacher's collector is.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    reads: AtomicU64,
    upserts: AtomicU64,
    rmws: AtomicU64,
    deletes: AtomicU64,

    read_cache_hits: AtomicU64,
    read_cache_misses: AtomicU64,
    records_copied_to_read_cache: AtomicU64,
    records_copied_to_tail: AtomicU64,

    chain_splices: AtomicU64,
    splice_cas_failures: AtomicU64,
    in_place_updates: AtomicU64,

    read_cache_evictions: AtomicU64,
    hlog_evictions: AtomicU64,
    lock_transfers_to_table: AtomicU64,
    lock_transfers_from_table: AtomicU64,

    internal_retries: AtomicU64,
    pending_io_enqueued: AtomicU64,
    pending_io_completed: AtomicU64,
    aborted_operations: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub reads: u64,
    pub upserts: u64,
    pub rmws: u64,
    pub deletes: u64,
    pub read_cache_hits: u64,
    pub read_cache_misses: u64,
    pub records_copied_to_read_cache: u64,
    pub records_copied_to_tail: u64,
    pub chain_splices: u64,
    pub splice_cas_failures: u64,
    pub in_place_updates: u64,
    pub read_cache_evictions: u64,
    pub hlog_evictions: u64,
    pub lock_transfers_to_table: u64,
    pub lock_transfers_from_table: u64,
    pub internal_retries: u64,
    pub pending_io_enqueued: u64,
    pub pending_io_completed: u64,
    pub aborted_operations: u64,
}

macro_rules! counter_methods {
    ($($field:ident => $method:ident),+ $(,)?) => {
        $(
            pub fn $method(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )+
    };
}

impl Metrics {
    counter_methods! {
        reads => record_read,
        upserts => record_upsert,
        rmws => record_rmw,
        deletes => record_delete,
        read_cache_hits => record_read_cache_hit,
        read_cache_misses => record_read_cache_miss,
        records_copied_to_read_cache => record_copied_to_read_cache,
        records_copied_to_tail => record_copied_to_tail,
        chain_splices => record_chain_splice,
        splice_cas_failures => record_splice_cas_failure,
        in_place_updates => record_in_place_update,
        read_cache_evictions => record_read_cache_eviction,
        hlog_evictions => record_hlog_eviction,
        lock_transfers_to_table => record_lock_transfer_to_table,
        lock_transfers_from_table => record_lock_transfer_from_table,
        internal_retries => record_internal_retry,
        pending_io_enqueued => record_pending_io_enqueued,
        pending_io_completed => record_pending_io_completed,
        aborted_operations => record_aborted_operation,
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
            rmws: self.rmws.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            read_cache_hits: self.read_cache_hits.load(Ordering::Relaxed),
            read_cache_misses: self.read_cache_misses.load(Ordering::Relaxed),
            records_copied_to_read_cache: self
                .records_copied_to_read_cache
                .load(Ordering::Relaxed),
            records_copied_to_tail: self.records_copied_to_tail.load(Ordering::Relaxed),
            chain_splices: self.chain_splices.load(Ordering::Relaxed),
            splice_cas_failures: self.splice_cas_failures.load(Ordering::Relaxed),
            in_place_updates: self.in_place_updates.load(Ordering::Relaxed),
            read_cache_evictions: self.read_cache_evictions.load(Ordering::Relaxed),
            hlog_evictions: self.hlog_evictions.load(Ordering::Relaxed),
            lock_transfers_to_table: self.lock_transfers_to_table.load(Ordering::Relaxed),
            lock_transfers_from_table: self.lock_transfers_from_table.load(Ordering::Relaxed),
            internal_retries: self.internal_retries.load(Ordering::Relaxed),
            pending_io_enqueued: self.pending_io_enqueued.load(Ordering::Relaxed),
            pending_io_completed: self.pending_io_completed.load(Ordering::Relaxed),
            aborted_operations: self.aborted_operations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let m = Metrics::default();
        m.record_read();
        m.record_read();
        m.record_upsert();
        let snap = m.snapshot();
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.upserts, 1);
        assert_eq!(snap.deletes, 0);
    }
}
