use hikari_handle::{AssetId, RawHandle};

use crate::{Asset, AssetType, Handle, LoadError};

/// Counted reference to an asset record whose type is only known at runtime
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ErasedHandle {
    raw: RawHandle,
    asset_type: AssetType,
}

impl ErasedHandle {
    pub(crate) fn from_raw(raw: RawHandle, asset_type: AssetType) -> Self {
        Self { raw, asset_type }
    }
    pub fn id(&self) -> AssetId {
        self.raw.id()
    }
    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }
    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }
    pub fn strong_count(&self) -> usize {
        self.raw.strong_count()
    }
    pub fn into_typed<T: Asset>(self) -> Option<Handle<T>> {
        self.try_typed().ok()
    }
    pub fn clone_typed<T: Asset>(&self) -> Option<Handle<T>> {
        self.clone().into_typed::<T>()
    }
    pub fn try_typed<T: Asset>(self) -> Result<Handle<T>, LoadError> {
        if self.asset_type.is::<T>() {
            Ok(Handle::from_raw(self.raw))
        } else {
            Err(LoadError::TypeMismatch {
                expected: T::NAME,
                found: self.asset_type.name(),
            })
        }
    }
}
