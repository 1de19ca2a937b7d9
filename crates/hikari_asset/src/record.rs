use std::{path::PathBuf, sync::Arc};

use hikari_handle::{AssetId, RefCounter};

use crate::{asset::ErasedAsset, AssetType, FileMeta, LoadError, LoadStatus};

/// Progress a record reports once a worker has started on it
pub(crate) const STARTED_PROGRESS: f32 = 0.1;
/// Ceiling for progress reported by loaders, only a finished load reaches 1.0
pub(crate) const MAX_INTERMEDIATE_PROGRESS: f32 = 0.99;

pub(crate) struct Record {
    pub id: AssetId,
    pub path: PathBuf,
    pub asset_type: AssetType,
    pub status: LoadStatus,
    pub progress: f32,
    pub counter: Arc<RefCounter>,
    /// Last successfully loaded value, kept through failed reloads
    pub payload: Option<ErasedAsset>,
    pub error: Option<LoadError>,
    /// File properties as seen by the last load attempt
    pub file: Option<FileMeta>,
    pub watch: bool,
    /// Whether the attempt in flight replaces an existing payload
    pub reloading: bool,
}

impl Record {
    pub fn new(id: AssetId, path: PathBuf, asset_type: AssetType, watch: bool) -> Self {
        Self {
            id,
            counter: RefCounter::new(id),
            path,
            asset_type,
            status: LoadStatus::Pending,
            progress: 0.0,
            payload: None,
            error: None,
            file: None,
            watch,
            reloading: false,
        }
    }
    pub fn ref_count(&self) -> usize {
        self.counter.count()
    }
    /// Records that loaded successfully at least once and aren't being loaded right now.
    /// A failed reload keeps the record watchable since its previous value is still served.
    pub fn is_watchable(&self) -> bool {
        self.watch && self.payload.is_some() && self.status.is_settled()
    }
    pub fn info(&self) -> AssetInfo {
        AssetInfo {
            id: self.id,
            path: self.path.clone(),
            type_name: self.asset_type.name(),
            status: self.status,
            progress: self.progress,
            ref_count: self.ref_count(),
            error: self.error.clone(),
            has_payload: self.payload.is_some(),
            watch_for_hot_reload: self.watch,
            file: self.file,
        }
    }
}

/// Point in time copy of an asset record
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub id: AssetId,
    pub path: PathBuf,
    pub type_name: &'static str,
    pub status: LoadStatus,
    pub progress: f32,
    pub ref_count: usize,
    pub error: Option<LoadError>,
    pub has_payload: bool,
    pub watch_for_hot_reload: bool,
    pub file: Option<FileMeta>,
}
