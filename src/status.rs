//! Session-facing completion codes and the internal retry-status enum.
//!
//! The teacher's `core::status::Status` conflates "this call finished" with
//! "this call needs to be retried for an internal reason" into one 22-variant
//! enum. This crate keeps the three control-flow altitudes in spec §9
//! distinct instead: [`Status`] is what a caller sees, [`OperationStatus`] is
//! what the engine's CAS loops privately juggle, and [`crate::error::StoreError`]
//! is reserved for unrecoverable conditions.

use std::fmt;

/// Outcome returned to a session for a completed or in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `Read` found the key and returned its value.
    Found,
    /// `Read` determined the key does not exist (or is tombstoned).
    NotFound,
    /// The operation needs a disk fetch; caller must drive
    /// `Session::complete_pending` to observe the final outcome.
    Pending,
    /// A user callback canceled the operation (e.g. `ReadContext` rejected a
    /// partially-resolved value).
    Canceled,
    /// `Upsert`/`RMW`/`Delete` appended a brand new record.
    CreatedRecord,
    /// `RMW` updated the chain head in place via `InPlaceUpdater`.
    InPlaceUpdated,
    /// `RMW` updated by copying an old record to a new one via
    /// `CopyUpdater`.
    CopyUpdated,
    /// The operation exhausted its retry budget without making progress.
    /// This is a logged, non-fatal outcome distinct from `StoreError`.
    Aborted,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Status::Aborted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Extra detail a `Read` can report alongside [`Status::Found`] /
/// [`Status::NotFound`], mirroring spec §6's `CopiedToReadCache`/
/// `CopiedToTail` bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCompletionInfo {
    pub copied_to_read_cache: bool,
    pub copied_to_tail: bool,
}

/// Internal statuses used by the chain-traversal and splice CAS loops.
/// Never surfaced to a session directly; the engine maps each variant to a
/// retry, an epoch refresh, a pending-I/O enqueue, or a `Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Operation completed; wraps the `Status` to return.
    Success(Status),
    /// Small-window conflict (e.g. chain head is `Sealed`, or a
    /// find-or-create race was lost). Retry immediately, same epoch.
    RetryNow,
    /// Conflict that requires refreshing the epoch before retrying (the
    /// observed address became unsafe to dereference).
    RetryLater,
    /// The key's latest record lives below `HeadAddress`; an
    /// `AsyncIOContext` has been enqueued.
    RecordOnDisk,
    /// A checkpoint phase transition was observed mid-operation; refresh the
    /// session's checkpoint version and retry.
    CprShiftDetected,
    /// Tail allocation hit an unflushed/unclosed page; wait for the
    /// flush/close event, then retry.
    AllocateFailed,
}

impl OperationStatus {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OperationStatus::Success(_))
    }
}
