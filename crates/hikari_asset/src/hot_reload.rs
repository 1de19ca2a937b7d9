use std::time::{Duration, Instant};

use hikari_handle::AssetId;
use rayon::prelude::*;

use crate::{pipeline::Shared, AssetConfig};

/// Polls the file system for changes to loaded assets
pub(crate) struct HotReloadMonitor {
    enabled: bool,
    interval: Duration,
    last_scan: Option<Instant>,
}

impl HotReloadMonitor {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            enabled: config.hot_reload,
            interval: config.hot_reload_interval(),
            last_scan: None,
        }
    }
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn due(&mut self, now: Instant) -> bool {
        match self.last_scan {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_scan = Some(now);
                true
            }
        }
    }
    /// Returns the watched assets whose file differs from the snapshot of their last load.
    /// Files that can't be stat'ed count as unchanged.
    ///
    /// Watching is not limited to `Loaded` records: a record whose reload failed still
    /// holds its previous value and stays watched, so fixing the file on disk reloads it.
    /// Records that never loaded are skipped, requesting them again retries the load.
    pub fn scan(&mut self, shared: &Shared) -> Vec<AssetId> {
        if !self.enabled || !self.due(Instant::now()) {
            return Vec::new();
        }

        // Stat outside the lock, the db is only held to copy the snapshots
        let watched = shared.db.lock().watched();

        watched
            .into_par_iter()
            .filter_map(|(id, path, snapshot)| match shared.io.metadata(&path) {
                Ok(current) if Some(current) != snapshot => {
                    log::info!("Detected change in {:?}", path);
                    Some(id)
                }
                Ok(_) => None,
                Err(err) => {
                    log::trace!("Couldn't stat {:?}, assuming unchanged: {}", path, err);
                    None
                }
            })
            .collect()
    }
}
