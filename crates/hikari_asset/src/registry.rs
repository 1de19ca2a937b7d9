use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{AssetType, DynLoader, Loader};

/// Maps asset types to the loader responsible for them
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: RwLock<HashMap<AssetType, Arc<dyn DynLoader>, fxhash::FxBuildHasher>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers `loader` for its asset type, returns true if it replaced a previous one
    pub fn register<L: Loader>(&self, loader: L) -> bool {
        self.register_dyn(Arc::new(loader))
    }
    pub fn register_dyn(&self, loader: Arc<dyn DynLoader>) -> bool {
        let asset_type = loader.asset_type();
        let previous = self.loaders.write().insert(asset_type, loader);

        match &previous {
            Some(previous) => log::warn!(
                "Replacing loader {} for asset type {}",
                previous.type_name(),
                asset_type
            ),
            None => log::debug!("Registered loader for asset type {}", asset_type),
        }

        previous.is_some()
    }
    pub fn resolve(&self, asset_type: &AssetType) -> Option<Arc<dyn DynLoader>> {
        self.loaders.read().get(asset_type).cloned()
    }
    pub fn contains(&self, asset_type: &AssetType) -> bool {
        self.loaders.read().contains_key(asset_type)
    }
    /// Asset types whose loader claims the given file extension
    pub fn find_by_extension(&self, extension: &str) -> Vec<AssetType> {
        self.loaders
            .read()
            .iter()
            .filter(|(_, loader)| loader.extensions().contains(&extension))
            .map(|(&asset_type, _)| asset_type)
            .collect()
    }
    pub fn type_names(&self) -> Vec<String> {
        self.loaders
            .read()
            .values()
            .map(|loader| loader.type_name().to_owned())
            .collect()
    }
    pub fn len(&self) -> usize {
        self.loaders.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::Asset;

    struct OtherTextureLoader;
    impl Loader for OtherTextureLoader {
        type Asset = Texture;

        fn extensions(&self) -> &[&str] {
            &["tex"]
        }
        fn load(&self, _ctx: &mut crate::LoadContext) -> anyhow::Result<Texture> {
            anyhow::bail!("never used")
        }
        fn type_name(&self) -> &str {
            "OtherTextureLoader"
        }
    }

    #[test]
    fn resolve_miss() {
        let registry = LoaderRegistry::new();
        assert!(registry.resolve(&AssetType::of::<Texture>()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn register_and_resolve() {
        let registry = LoaderRegistry::new();
        assert!(!registry.register(TextureLoader::default()));

        let loader = registry.resolve(&AssetType::of::<Texture>()).unwrap();
        assert_eq!(loader.type_name(), Texture::NAME);
        assert!(registry.resolve(&AssetType::of::<Shader>()).is_none());
    }

    #[test]
    fn register_replaces_previous() {
        let registry = LoaderRegistry::new();
        registry.register(TextureLoader::default());
        assert!(registry.register(OtherTextureLoader));

        assert_eq!(registry.len(), 1);
        let loader = registry.resolve(&AssetType::of::<Texture>()).unwrap();
        assert_eq!(loader.type_name(), "OtherTextureLoader");
    }

    #[test]
    fn lookup_by_extension() {
        let registry = LoaderRegistry::new();
        registry.register(TextureLoader::default());
        registry.register(ShaderLoader);

        assert_eq!(registry.find_by_extension("bin"), vec![AssetType::of::<Texture>()]);
        assert_eq!(registry.find_by_extension("glsl"), vec![AssetType::of::<Shader>()]);
        assert!(registry.find_by_extension("png").is_empty());
    }
}
