//! User-pluggable record update logic for `Rmw` (spec §4.3).
//!
//! The teacher's callback surface (`InPlaceUpdater`/`CopyUpdater`/
//! `InitialUpdater`, keyed off fixed-layout byte records that may or may not
//! have room to grow in place) doesn't have much to split apart once a
//! record's value is an owned Rust value rather than a byte blob with a
//! declared capacity — there's no "does the new value fit in the old slot's
//! allocation" question to answer. What does carry over is the three-way
//! callback shape itself: an `Rmw` needs to know how to produce a value when
//! the key doesn't exist yet, how to fold an update into an existing value
//! in place, and how to produce an updated copy when in-place isn't safe
//! (the chain head is immutable, i.e. below `ReadOnlyAddress`).
use serde::{Serialize, de::DeserializeOwned};

/// Read-modify-write update logic, supplied per call to
/// [`crate::engine::FasterKv::rmw`].
pub trait RmwCallback<V> {
    /// Produces the value to store when the key has no prior record.
    fn initial_update(&self) -> V;

    /// Attempts to fold the update into `value` without reallocating.
    /// Returns `false` if the update can't be applied in place, in which
    /// case the engine falls back to [`RmwCallback::copy_update`].
    fn in_place_update(&self, value: &mut V) -> bool;

    /// Produces an updated copy of `old_value` for a freshly-appended
    /// record, used when the chain head is immutable.
    fn copy_update(&self, old_value: &V) -> V;
}

/// Adapts a single closure `V -> V` (with a caller-supplied default for the
/// not-found case) into an [`RmwCallback`] that always copies. Convenient
/// for simple accumulator-style updates that don't need a true in-place
/// fast path.
pub struct CopyingRmw<V, F> {
    default: V,
    fold: F,
}

impl<V, F> CopyingRmw<V, F>
where
    V: Clone,
    F: Fn(&V) -> V,
{
    pub fn new(default: V, fold: F) -> Self {
        Self { default, fold }
    }
}

impl<V, F> RmwCallback<V> for CopyingRmw<V, F>
where
    V: Clone,
    F: Fn(&V) -> V,
{
    fn initial_update(&self) -> V {
        self.default.clone()
    }

    fn in_place_update(&self, _value: &mut V) -> bool {
        false
    }

    fn copy_update(&self, old_value: &V) -> V {
        (self.fold)(old_value)
    }
}

/// Bound every engine instance requires on its value type: values must
/// round-trip through the on-disk/checkpoint encoding.
pub trait RecordValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}
impl<T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static> RecordValue for T {}
