//! Store configuration.
//!
//! Mirrors the shape of the teacher's `common::Config` (plain serde-derived
//! struct with a `validate()` pass and a couple of named presets) but scoped
//! to the knobs this engine actually reads: log sizing, read-cache sizing,
//! table geometry, checkpointing, and background threading.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Sizing for a single append-only ring (the hybrid log, or the read cache).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogSettings {
    /// log2 of the total number of addressable bytes kept resident.
    pub memory_size_bits: u8,
    /// log2 of a single page's slot capacity.
    pub page_size_bits: u8,
}

impl LogSettings {
    pub fn new(memory_size_bits: u8, page_size_bits: u8) -> Self {
        Self {
            memory_size_bits,
            page_size_bits,
        }
    }

    pub fn pages_in_memory(&self) -> u32 {
        1u32 << (self.memory_size_bits.saturating_sub(self.page_size_bits))
    }

    pub fn page_capacity(&self) -> u32 {
        1u32 << self.page_size_bits
    }

    fn validate(&self, name: &str) -> Result<(), StoreError> {
        if self.page_size_bits == 0 {
            return Err(StoreError::InvalidConfig(format!(
                "{name}.page_size_bits must be > 0"
            )));
        }
        if self.memory_size_bits < self.page_size_bits {
            return Err(StoreError::InvalidConfig(format!(
                "{name}.memory_size_bits ({}) must be >= page_size_bits ({})",
                self.memory_size_bits, self.page_size_bits
            )));
        }
        if self.page_size_bits as u32 >= crate::core::address::Address::K_OFFSET_BITS as u32 {
            return Err(StoreError::InvalidConfig(format!(
                "{name}.page_size_bits ({}) exceeds the addressable offset width",
                self.page_size_bits
            )));
        }
        Ok(())
    }
}

/// Read-cache sizing. Absent entirely disables the read cache (spec §6).
pub type ReadCacheSettings = LogSettings;

/// Per-call flags that shape a `Read`'s side effects, matching spec §6.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReadFlags {
    /// Never install or refresh a read-cache copy for this read.
    pub disable_read_cache_updates: bool,
    /// Never serve this read from the read cache, even if a copy exists.
    pub disable_read_cache_reads: bool,
    /// On a cold read, append a fresh copy at the HLOG tail instead of (or
    /// in addition to, if the read cache is disabled) the read cache.
    pub copy_reads_to_tail: bool,
    /// Only satisfy this read from the on-disk device; skip read cache and
    /// in-memory HLOG entirely (used by verification tooling).
    pub copy_from_device_only: bool,
    /// Clear the record's `Modified` bit as part of serving this read.
    pub reset_modified_bit: bool,
}

/// Top-level store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log: LogSettings,
    pub read_cache: Option<ReadCacheSettings>,
    /// Number of buckets in the primary hash table. Must be a power of two.
    pub table_size: u64,
    pub checkpoint_dir: String,
    pub checkpoint_interval_ms: u64,
    pub max_background_threads: usize,
    /// Number of shards backing the lock table's `DashMap`.
    pub lock_table_shards: usize,
    /// Bound on internal CAS-retry loops before an operation aborts instead
    /// of spinning forever (spec §7).
    pub retry_budget: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogSettings::new(30, 25),
            read_cache: Some(ReadCacheSettings::new(25, 20)),
            table_size: 1 << 16,
            checkpoint_dir: "./checkpoints".to_string(),
            checkpoint_interval_ms: 60_000,
            max_background_threads: 2,
            lock_table_shards: 16,
            retry_budget: 10_000,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), StoreError> {
        self.log.validate("log")?;
        if let Some(rc) = &self.read_cache {
            rc.validate("read_cache")?;
        }
        if !crate::core::utility::is_power_of_two(self.table_size) {
            return Err(StoreError::InvalidConfig(format!(
                "table_size ({}) must be a power of two",
                self.table_size
            )));
        }
        if self.table_size == 0 {
            return Err(StoreError::InvalidConfig("table_size must be > 0".into()));
        }
        if self.max_background_threads == 0 {
            log::warn!("max_background_threads is 0; eviction will never run in the background");
        }
        if self.lock_table_shards == 0 {
            return Err(StoreError::InvalidConfig(
                "lock_table_shards must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// A small, low-memory preset useful for tests.
    pub fn low_memory() -> Self {
        Self {
            log: LogSettings::new(20, 16),
            read_cache: Some(ReadCacheSettings::new(18, 14)),
            table_size: 1 << 10,
            lock_table_shards: 4,
            ..Default::default()
        }
    }
}
