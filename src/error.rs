//! Fatal, store-wide error type.
//!
//! Everything recoverable inside an operation (lost CAS races, epoch
//! refreshes, tentative-entry conflicts) is handled with the internal
//! [`crate::status::OperationStatus`] retry loop and never reaches here.
//! `StoreError` is reserved for conditions that leave the store unable to
//! make progress on mutations: a corrupt checkpoint, a disk failure, or an
//! invariant violation.

use thiserror::Error;

/// Fatal error surfaced to callers. Once one of these is returned the store
/// flips its health gate (see [`crate::engine::FasterKv`]) and refuses
/// further mutating operations, though reads keep working.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint (de)serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("checkpoint metadata version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("checkpoint metadata checksum mismatch")]
    ChecksumMismatch,

    #[error("malformed checkpoint metadata: {0}")]
    CorruptCheckpoint(String),

    #[error("checkpoint not found at {0}")]
    CheckpointNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("record too large for a single page (size {size}, page capacity {capacity})")]
    RecordTooLarge { size: usize, capacity: usize },

    #[error("chain invariant violated: {0}")]
    InvariantViolation(String),

    #[error("store is unhealthy after a prior fatal error and refuses further mutations")]
    StoreUnhealthy,

    #[error("operation retry budget ({budget}) exhausted without making progress")]
    RetryBudgetExhausted { budget: u32 },
}

impl StoreError {
    /// True for conditions where the data on disk/in memory is suspect and
    /// the store should stop accepting writes.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::ChecksumMismatch
                | StoreError::CorruptCheckpoint(_)
                | StoreError::InvariantViolation(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
