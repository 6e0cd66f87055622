//! Checkpoint metadata: a textual, versioned, XOR-checksummed snapshot of a
//! store's log-region addresses, for crash recovery (spec §6).
//!
//! Grounded on `core::checkpoint`'s `IndexMetadata`/`LogMetadata` field sets
//! (same field names: `table_size`, `log_begin_address`,
//! `flushed_address`/`flushedLogicalAddress`, `final_address`, and so on) but
//! not its encoding: that struct is never actually serialized anywhere in
//! the teacher's tree, and the teacher's own `checkpoint()` call site in
//! `hlog/persistent_memory_malloc.rs` calls `LogMetadata::new(...)` and
//! `.update_checksum()`, neither of which the struct it names defines — that
//! path does not compile as written. This module replaces it with a real
//! line-per-field text writer/reader carrying the XOR checksum spec §6
//! describes, rather than carrying the broken pattern forward.
//!
//! A full multi-phase CPR protocol (per-session serial numbers, an object
//! log, incremental delta checkpoints) is out of scope (spec §1); this is a
//! single blocking prepare/persist/recover cycle over one metadata file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::address::Address;
use crate::device::Disk;
use crate::engine::FasterKv;
use crate::error::{StoreError, StoreResult};

const FORMAT_VERSION: u32 = 1;
const METADATA_FILE_NAME: &str = "checkpoint.meta";

static GUID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fresh_guid() -> u128 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let counter = GUID_COUNTER.fetch_add(1, Ordering::Relaxed);
    ((nanos as u128) << 64) | counter as u128
}

/// A point-in-time snapshot of a store's log-region addresses, in the
/// textual line-per-field layout spec §6 names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMetadata {
    pub metadata_version: u32,
    pub guid: u128,
    pub snapshot: bool,
    pub log_version: u32,
    pub next_version: u32,
    pub flushed_address: Address,
    pub start_address: Address,
    pub final_address: Address,
    pub snapshot_final_address: Address,
    pub head_address: Address,
    pub begin_address: Address,
    pub delta_tail_address: Address,
    pub manual_locking_active: bool,
    pub session_count: u32,
    pub object_log_segment_count: u32,
}

impl CheckpointMetadata {
    /// `guid_lo XOR guid_hi XOR version XOR` (the five address fields)
    /// `XOR sessionCount XOR segCount`, per spec §6.
    fn checksum(&self) -> u64 {
        let guid_lo = self.guid as u64;
        let guid_hi = (self.guid >> 64) as u64;
        guid_lo
            ^ guid_hi
            ^ self.metadata_version as u64
            ^ self.flushed_address.control()
            ^ self.start_address.control()
            ^ self.final_address.control()
            ^ self.head_address.control()
            ^ self.begin_address.control()
            ^ self.session_count as u64
            ^ self.object_log_segment_count as u64
    }

    fn to_lines(&self) -> Vec<String> {
        vec![
            format!("version:{}", self.metadata_version),
            format!("checksum:{}", self.checksum()),
            format!("guid:{:032x}", self.guid),
            format!("snapshot:{}", self.snapshot),
            format!("logVersion:{}", self.log_version),
            format!("nextVersion:{}", self.next_version),
            format!("flushedLogicalAddress:{}", self.flushed_address.control()),
            format!("startLogicalAddress:{}", self.start_address.control()),
            format!("finalLogicalAddress:{}", self.final_address.control()),
            format!(
                "snapshotFinalLogicalAddress:{}",
                self.snapshot_final_address.control()
            ),
            format!("headAddress:{}", self.head_address.control()),
            format!("beginAddress:{}", self.begin_address.control()),
            format!("deltaTailAddress:{}", self.delta_tail_address.control()),
            format!("manualLockingActive:{}", self.manual_locking_active),
            format!("sessionCount:{}", self.session_count),
            format!("objectLogSegmentCount:{}", self.object_log_segment_count),
        ]
    }

    fn from_lines(text: &str) -> StoreResult<Self> {
        let mut fields = std::collections::HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                StoreError::CorruptCheckpoint(format!("malformed metadata line: {line}"))
            })?;
            fields.insert(key.to_string(), value.to_string());
        }

        let get = |name: &str| -> StoreResult<String> {
            fields
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::CorruptCheckpoint(format!("missing field {name}")))
        };
        let get_u64 = |name: &str| -> StoreResult<u64> {
            get(name)?
                .parse()
                .map_err(|_| StoreError::CorruptCheckpoint(format!("field {name} is not a u64")))
        };
        let get_u32 = |name: &str| -> StoreResult<u32> {
            get(name)?
                .parse()
                .map_err(|_| StoreError::CorruptCheckpoint(format!("field {name} is not a u32")))
        };
        let get_bool = |name: &str| -> StoreResult<bool> {
            get(name)?
                .parse()
                .map_err(|_| StoreError::CorruptCheckpoint(format!("field {name} is not a bool")))
        };
        let get_address = |name: &str| -> StoreResult<Address> {
            Ok(Address::from_control(get_u64(name)?))
        };

        let metadata_version = get_u32("version")?;
        if metadata_version != FORMAT_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: FORMAT_VERSION,
                found: metadata_version,
            });
        }
        let guid = u128::from_str_radix(&get("guid")?, 16)
            .map_err(|_| StoreError::CorruptCheckpoint("guid is not valid hex".into()))?;

        let metadata = CheckpointMetadata {
            metadata_version,
            guid,
            snapshot: get_bool("snapshot")?,
            log_version: get_u32("logVersion")?,
            next_version: get_u32("nextVersion")?,
            flushed_address: get_address("flushedLogicalAddress")?,
            start_address: get_address("startLogicalAddress")?,
            final_address: get_address("finalLogicalAddress")?,
            snapshot_final_address: get_address("snapshotFinalLogicalAddress")?,
            head_address: get_address("headAddress")?,
            begin_address: get_address("beginAddress")?,
            delta_tail_address: get_address("deltaTailAddress")?,
            manual_locking_active: get_bool("manualLockingActive")?,
            session_count: get_u32("sessionCount")?,
            object_log_segment_count: get_u32("objectLogSegmentCount")?,
        };

        let expected_checksum = get_u64("checksum")?;
        if metadata.checksum() != expected_checksum {
            return Err(StoreError::ChecksumMismatch);
        }
        Ok(metadata)
    }

    fn write_to(&self, path: &Path) -> StoreResult<()> {
        let body = self.to_lines().join("\n");
        fs::write(path, body)?;
        Ok(())
    }

    fn read_from(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Err(StoreError::CheckpointNotFound(
                path.display().to_string(),
            ));
        }
        let text = fs::read_to_string(path)?;
        Self::from_lines(&text)
    }
}

fn metadata_path(dir: &str) -> PathBuf {
    Path::new(dir).join(METADATA_FILE_NAME)
}

/// Captures the store's current log-region addresses and persists them as a
/// single blocking snapshot under `dir` (spec §6's "prepare/persist" pair
/// collapsed into one call, since there is no concurrent-mutation-during-
/// checkpoint protocol implemented here — see the checkpoint scope decision
/// in `DESIGN.md`).
pub fn checkpoint<K, V, D>(store: &FasterKv<K, V, D>, dir: &str) -> StoreResult<CheckpointMetadata>
where
    K: std::hash::Hash + Eq + Clone + serde::Serialize + serde::de::DeserializeOwned,
    V: Clone + serde::Serialize + serde::de::DeserializeOwned,
    D: Disk,
{
    let (begin, head, read_only, tail) = store.log_addresses();
    let metadata = CheckpointMetadata {
        metadata_version: FORMAT_VERSION,
        guid: fresh_guid(),
        snapshot: true,
        log_version: 0,
        next_version: 1,
        flushed_address: read_only,
        start_address: begin,
        final_address: tail,
        snapshot_final_address: tail,
        head_address: head,
        begin_address: begin,
        delta_tail_address: Address::INVALID_ADDRESS,
        manual_locking_active: store.has_active_locks(),
        session_count: 0,
        object_log_segment_count: 0,
    };

    let path = Path::new(dir);
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    metadata.write_to(&metadata_path(dir))?;
    Ok(metadata)
}

/// Reads back the most recent checkpoint written under `dir`, validating its
/// version and checksum. Restoring the store's in-memory state from the
/// recovered addresses (replaying the log up to `final_address`) is left to
/// the caller, since it's specific to how the log's backing pages were
/// persisted, not to the metadata format itself.
pub fn recover(dir: &str) -> StoreResult<CheckpointMetadata> {
    CheckpointMetadata::read_from(&metadata_path(dir))
}
