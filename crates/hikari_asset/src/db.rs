use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use hikari_handle::{AssetId, IdAllocator};
use nohash_hasher::IntMap;

use crate::{record::Record, AssetType, FileMeta};

/// Every asset record known to the manager, indexed by identity and by (path, type)
#[derive(Default)]
pub(crate) struct AssetDB {
    records: IntMap<AssetId, Record>,
    path_to_id: HashMap<(PathBuf, AssetType), AssetId, fxhash::FxBuildHasher>,
    ids: IdAllocator,
}

impl AssetDB {
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns the record for `path` and `asset_type`, creating it in `Pending` if needed.
    /// The flag is true when a new record was created.
    pub fn get_or_create(
        &mut self,
        path: &Path,
        asset_type: AssetType,
        watch: bool,
    ) -> (&mut Record, bool) {
        let key = (path.to_owned(), asset_type);
        let (id, created) = match self.path_to_id.get(&key) {
            Some(&id) => (id, false),
            None => {
                let id = self.ids.allocate();
                self.path_to_id.insert(key, id);
                (id, true)
            }
        };

        let record = self
            .records
            .entry(id)
            .or_insert_with(|| Record::new(id, path.to_owned(), asset_type, watch));

        (record, created)
    }
    pub fn find(&self, path: &Path, asset_type: AssetType) -> Option<AssetId> {
        self.path_to_id.get(&(path.to_owned(), asset_type)).copied()
    }
    pub fn get(&self, id: AssetId) -> Option<&Record> {
        self.records.get(&id)
    }
    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut Record> {
        self.records.get_mut(&id)
    }
    pub fn remove(&mut self, id: AssetId) -> Option<Record> {
        let record = self.records.remove(&id)?;
        self.path_to_id.remove(&(record.path.clone(), record.asset_type));
        Some(record)
    }
    /// Removes settled records nobody holds a handle to
    pub fn remove_unused(&mut self) -> Vec<Record> {
        let unused: Vec<AssetId> = self
            .records
            .values()
            .filter(|record| record.ref_count() == 0 && record.status.is_settled())
            .map(|record| record.id)
            .collect();

        unused.into_iter().filter_map(|id| self.remove(id)).collect()
    }
    /// Drops every record, the id allocator keeps counting
    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        self.path_to_id.clear();
        count
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }
    pub fn pending_count(&self) -> usize {
        self.records()
            .filter(|record| record.status.is_in_flight())
            .count()
    }
    /// Mean progress of every pending or loading record, 1.0 when nothing is in flight
    pub fn overall_progress(&self) -> f32 {
        let (count, sum) = self
            .records()
            .filter(|record| record.status.is_in_flight())
            .fold((0usize, 0.0f32), |(count, sum), record| {
                (count + 1, sum + record.progress)
            });

        if count == 0 {
            1.0
        } else {
            sum / count as f32
        }
    }
    /// Snapshot of what the hot reload monitor has to stat
    pub fn watched(&self) -> Vec<(AssetId, PathBuf, Option<FileMeta>)> {
        self.records()
            .filter(|record| record.is_watchable())
            .map(|record| (record.id, record.path.clone(), record.file))
            .collect()
    }
}
