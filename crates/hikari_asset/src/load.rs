use std::{path::Path, sync::Arc};

use crate::{asset::ErasedAsset, Asset, AssetType, IO};

/// Everything a loader gets to see while turning a file into an asset
pub struct LoadContext<'a> {
    path: &'a Path,
    asset_dir: &'a Path,
    io: &'a dyn IO,
    reload: bool,
    progress: &'a (dyn Fn(f32) + Send + Sync),
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(
        path: &'a Path,
        asset_dir: &'a Path,
        io: &'a dyn IO,
        reload: bool,
        progress: &'a (dyn Fn(f32) + Send + Sync),
    ) -> Self {
        Self {
            path,
            asset_dir,
            io,
            reload,
            progress,
        }
    }
    /// Absolute, normalized path of the asset
    pub fn path(&self) -> &Path {
        self.path
    }
    /// Root the asset manager resolved the path against
    pub fn asset_dir(&self) -> &Path {
        self.asset_dir
    }
    pub fn io(&self) -> &dyn IO {
        self.io
    }
    pub fn read(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.io.read_file(self.path)?)
    }
    pub fn is_reload(&self) -> bool {
        self.reload
    }
    /// Reports intermediate progress in `[0, 1)`.
    /// Values lower than what was already reported are ignored.
    pub fn set_progress(&self, progress: f32) {
        (self.progress)(progress)
    }
}

pub trait Loader: Send + Sync + 'static {
    type Asset: Asset;

    fn extensions(&self) -> &[&str];
    /// Blocking load, runs on a worker thread.
    /// Called concurrently for different paths but never twice at once for the same asset.
    fn load(&self, ctx: &mut LoadContext) -> anyhow::Result<Self::Asset>;

    fn type_name(&self) -> &str {
        <Self::Asset as Asset>::NAME
    }
}

/// Object safe view of a [`Loader`], as stored in the registry
pub trait DynLoader: Send + Sync + 'static {
    fn asset_type(&self) -> AssetType;
    fn extensions(&self) -> &[&str];
    fn type_name(&self) -> &str;
    fn supports_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().iter().any(|&supported| supported == ext))
            .unwrap_or(false)
    }
    #[doc(hidden)]
    fn load_erased(&self, ctx: &mut LoadContext) -> anyhow::Result<ErasedAsset>;
}

impl<L: Loader> DynLoader for L {
    fn asset_type(&self) -> AssetType {
        AssetType::of::<L::Asset>()
    }
    fn extensions(&self) -> &[&str] {
        Loader::extensions(self)
    }
    fn type_name(&self) -> &str {
        Loader::type_name(self)
    }
    fn load_erased(&self, ctx: &mut LoadContext) -> anyhow::Result<ErasedAsset> {
        let asset = self.load(ctx)?;
        Ok(Arc::new(asset))
    }
}
