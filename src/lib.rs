//! # faster-rc: a hybrid-log key-value store's read-cache chain and
//! lock-transfer subsystem
//!
//! A FASTER-style concurrent store built around two append-only record
//! rings — the hybrid log (HLOG) and a read cache (RC) — sharing one hash
//! index. Cold records fetched from disk are cached into the RC and spliced
//! onto the same hash-bucket chains the HLOG uses; eviction from either ring
//! transfers any lock state a record held into an overflow lock table (the
//! LT), and a later re-residency restores it. See [`engine::FasterKv`] for
//! the top-level API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use faster_rc::{Config, FasterKv, NullDisk, ReadFlags};
//!
//! let store = FasterKv::new(Config::default(), NullDisk)?;
//! store.upsert("hello".to_string(), "world".to_string())?;
//! let (status, value) = store.read(&"hello".to_string(), ReadFlags::default())?;
//! # Ok::<(), faster_rc::StoreError>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod async_io;
pub mod callbacks;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod device;
pub mod engine;
pub mod environment;
pub mod error;
pub mod eviction;
pub mod hlog;
pub mod index;
pub mod lock_table;
pub mod metrics;
pub mod paged_log;
pub mod read_cache;
pub mod record;
pub mod session;
pub mod status;

pub use callbacks::{CopyingRmw, RecordValue, RmwCallback};
pub use checkpoint::CheckpointMetadata;
pub use config::{Config, LogSettings, ReadCacheSettings, ReadFlags};
pub use core::address::Address;
pub use device::{Disk, FileSystemDisk, NullDisk};
pub use engine::FasterKv;
pub use error::{StoreError, StoreResult};
pub use lock_table::{LockMode, LockState, LockTable};
pub use metrics::{Metrics, MetricsSnapshot};
pub use session::Session;
pub use status::{OperationStatus, Status};
