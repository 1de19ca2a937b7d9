use std::{
    any::{Any, TypeId},
    hash::Hash,
    sync::Arc,
};

pub trait Asset: Send + Sync + 'static {
    /// Human readable name used in logs and errors
    const NAME: &'static str;
}

/// Loaded value as stored by the record store, independent of its concrete type
pub type ErasedAsset = Arc<dyn Any + Send + Sync + 'static>;

/// Runtime identity of an asset type
#[derive(Clone, Copy, Debug)]
pub struct AssetType {
    id: TypeId,
    name: &'static str,
}

impl AssetType {
    pub fn of<T: Asset>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
        }
    }
    pub fn type_id(&self) -> TypeId {
        self.id
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn is<T: Asset>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for AssetType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for AssetType {}

impl Hash for AssetType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
