use std::marker::PhantomData;

use hikari_handle::{AssetId, RawHandle};

use super::erased::ErasedHandle;
use crate::{Asset, AssetType};

/// Counted reference to an asset record of type `T`.
///
/// Cloning bumps the record's reference count, dropping releases it.
/// Records are only freed by an explicit sweep, so a handle never dangles:
/// once its record is gone every lookup through it simply returns `None`.
pub struct Handle<T> {
    raw: RawHandle,
    _phantom: PhantomData<T>,
}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<T> Eq for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self {
            raw: RawHandle::invalid(),
            _phantom: PhantomData,
        }
    }
}

impl<T: Asset> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle<{}>({})", T::NAME, self.raw.id())
    }
}

impl<T: Asset> Handle<T> {
    pub(crate) fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _phantom: PhantomData,
        }
    }
    pub fn invalid() -> Self {
        Self::default()
    }
    pub fn id(&self) -> AssetId {
        self.raw.id()
    }
    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }
    pub fn strong_count(&self) -> usize {
        self.raw.strong_count()
    }
    pub fn asset_type(&self) -> AssetType {
        AssetType::of::<T>()
    }
    pub fn clone_erased(&self) -> ErasedHandle {
        self.clone().into()
    }
}

impl<T: Asset> From<Handle<T>> for ErasedHandle {
    fn from(handle: Handle<T>) -> Self {
        ErasedHandle::from_raw(handle.raw, AssetType::of::<T>())
    }
}
