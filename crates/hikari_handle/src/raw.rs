use std::hash::Hash;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::common::*;

/// Reference count shared by an asset record and every strong handle to it
pub struct RefCounter {
    id: AssetId,
    strong: AtomicUsize,
}
impl RefCounter {
    /// Counters start at zero, the first handle brings them to one
    pub fn new(id: AssetId) -> Arc<Self> {
        Arc::new(Self {
            id,
            strong: AtomicUsize::new(0),
        })
    }
    pub fn id(&self) -> AssetId {
        self.id
    }
    pub fn count(&self) -> usize {
        self.strong.load(Ordering::Acquire)
    }
}

pub struct RawHandle {
    id: AssetId,
    counter: Option<Arc<RefCounter>>,
}

impl RawHandle {
    pub fn invalid() -> Self {
        Self {
            id: AssetId::INVALID,
            counter: None,
        }
    }
    pub fn strong(counter: &Arc<RefCounter>) -> Self {
        counter.strong.fetch_add(1, Ordering::Relaxed);

        Self {
            id: counter.id,
            counter: Some(counter.clone()),
        }
    }
    pub fn id(&self) -> AssetId {
        self.id
    }
    pub fn is_valid(&self) -> bool {
        self.counter.is_some()
    }
    pub fn strong_count(&self) -> usize {
        self.counter
            .as_ref()
            .map(|counter| counter.count())
            .unwrap_or(0)
    }
}

impl Default for RawHandle {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Clone for RawHandle {
    fn clone(&self) -> Self {
        match &self.counter {
            Some(counter) => Self::strong(counter),
            None => Self::invalid(),
        }
    }
}

impl Drop for RawHandle {
    fn drop(&mut self) {
        if let Some(counter) = &self.counter {
            let old = counter.strong.fetch_sub(1, Ordering::AcqRel);
            debug_assert!(old != 0, "Reference count underflow on {}", self.id);
        }
    }
}

impl PartialEq for RawHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for RawHandle {}

impl Hash for RawHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawHandle")
            .field("id", &self.id)
            .field("strong", &self.strong_count())
            .finish()
    }
}
