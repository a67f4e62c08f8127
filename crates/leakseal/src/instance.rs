//! Opaque identifiers for tracked instances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static INSTANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one live tracked instance.
///
/// Ids are only used for display and membership. Two descriptors are never
/// compared by the ids they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Draws a fresh id from a process-wide counter.
    pub fn next() -> Self {
        Self(INSTANCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Derives the id from the address of `value`.
    ///
    /// Only meaningful for values that do not move while tracked (boxed,
    /// `Arc`-owned or otherwise pinned), because a moved value keeps its old id.
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self((value as *const T).cast::<()>() as usize as u64)
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
