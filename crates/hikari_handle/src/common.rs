use std::sync::atomic::{AtomicU64, Ordering};

/// Process unique identity of one asset record. `0` is reserved for invalid handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct AssetId(u64);

impl AssetId {
    pub const INVALID: AssetId = AssetId(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
    pub fn raw(&self) -> u64 {
        self.0
    }
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl nohash_hasher::IsEnabled for AssetId {}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing ids, never reusing one
pub struct IdAllocator {
    next: AtomicU64,
}
impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
    pub fn allocate(&self) -> AssetId {
        AssetId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
