use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use hikari_handle::{AssetId, RawHandle};
use hikari_path::PathResolver;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};

use crate::{
    asset::ErasedAsset,
    events::SettleTracker,
    hot_reload::HotReloadMonitor,
    pipeline::{self, Shared},
    record::Record,
    Asset, AssetConfig, AssetError, AssetEvent, AssetInfo, AssetType, ErasedHandle, EventBus,
    Handle, LoadError, LoadStatus, Loader, LoaderRegistry, PhysicalIO, IO,
};

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Only applies when the request creates the record
    pub watch_for_hot_reload: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            watch_for_hot_reload: true,
        }
    }
}

struct Runtime {
    resolver: RwLock<PathResolver>,
    event_bus: Arc<dyn EventBus>,
    monitor: Mutex<HotReloadMonitor>,
    tracker: Mutex<SettleTracker>,
}

impl Runtime {
    fn asset_dir(&self) -> PathBuf {
        self.resolver.read().root().to_owned()
    }
}

enum Lifecycle {
    Uninitialized,
    Running(Runtime),
    ShutDown,
}

struct AssetManagerInner {
    shared: Arc<Shared>,
    config: AssetConfig,
    lifecycle: RwLock<Lifecycle>,
}

/// Loads, caches and hot reloads assets, every load attempt on a thread of its own.
///
/// Cloning is cheap, every clone talks to the same store. `update` is meant
/// to be called once per frame from a single thread; it installs nothing
/// itself but publishes the notifications of loads that finished in between
/// and kicks off hot reloads.
///
/// Operations that change state return `AssetError::NotInitialized` or
/// `AssetError::ShutDown` outside of `initialize`/`shutdown`. Read-only queries
/// (`get`, `status`, `handle`, `wait_for`, `asset_count`, ...) are allowed in
/// any state and see an empty store there.
#[derive(Clone)]
pub struct AssetManager {
    inner: Arc<AssetManagerInner>,
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::new(AssetConfig::default())
    }
}

impl AssetManager {
    pub fn new(config: AssetConfig) -> Self {
        Self::with_io(config, PhysicalIO)
    }
    pub fn with_io(config: AssetConfig, io: impl IO) -> Self {
        Self {
            inner: Arc::new(AssetManagerInner {
                shared: Arc::new(Shared::new(Arc::new(io))),
                config,
                lifecycle: RwLock::new(Lifecycle::Uninitialized),
            }),
        }
    }
    pub fn config(&self) -> &AssetConfig {
        &self.inner.config
    }
    pub fn initialize(
        &self,
        root: impl AsRef<Path>,
        event_bus: Arc<dyn EventBus>,
    ) -> Result<(), AssetError> {
        let mut lifecycle = self.inner.lifecycle.write();
        match *lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Running(_) => return Err(AssetError::AlreadyInitialized),
            Lifecycle::ShutDown => return Err(AssetError::ShutDown),
        }

        let resolver = PathResolver::new(root)?;

        log::info!("Asset manager initialized with root {:?}", resolver.root());

        *lifecycle = Lifecycle::Running(Runtime {
            resolver: RwLock::new(resolver),
            event_bus,
            monitor: Mutex::new(HotReloadMonitor::new(&self.inner.config)),
            tracker: Mutex::new(SettleTracker::default()),
        });

        Ok(())
    }
    /// Waits for every load in flight, then releases all records.
    /// Outstanding handles stay valid as values but no longer resolve to anything.
    pub fn shutdown(&self) -> Result<(), AssetError> {
        let runtime = {
            let mut lifecycle = self.inner.lifecycle.write();
            match std::mem::replace(&mut *lifecycle, Lifecycle::ShutDown) {
                Lifecycle::Running(runtime) => runtime,
                Lifecycle::Uninitialized => {
                    *lifecycle = Lifecycle::Uninitialized;
                    return Err(AssetError::NotInitialized);
                }
                Lifecycle::ShutDown => return Err(AssetError::ShutDown),
            }
        };

        let shared = &self.inner.shared;
        log::info!(
            "Shutting down asset manager, waiting on {} load tasks",
            shared.tasks_in_flight()
        );
        shared.wait_idle();

        let released = {
            let mut db = shared.db.lock();
            shared.drain_completions();
            db.clear()
        };
        log::info!("Released {} assets", released);

        drop(runtime);
        Ok(())
    }
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.lifecycle.read(), Lifecycle::Running(_))
    }
    fn runtime(&self) -> Result<MappedRwLockReadGuard<'_, Runtime>, AssetError> {
        RwLockReadGuard::try_map(self.inner.lifecycle.read(), |lifecycle| match lifecycle {
            Lifecycle::Running(runtime) => Some(runtime),
            _ => None,
        })
        .map_err(|lifecycle| match *lifecycle {
            Lifecycle::ShutDown => AssetError::ShutDown,
            _ => AssetError::NotInitialized,
        })
    }
    /// Registers `loader` for its asset type, replacing any previous one.
    /// Allowed at any time, including before `initialize`.
    pub fn register_loader<L: Loader>(&self, loader: L) -> bool {
        self.inner.shared.registry.register(loader)
    }
    pub fn registry(&self) -> &LoaderRegistry {
        &self.inner.shared.registry
    }
    pub fn root(&self) -> Result<PathBuf, AssetError> {
        Ok(self.runtime()?.asset_dir())
    }
    /// Only affects paths requested afterwards, cached records keep their path
    pub fn set_root(&self, root: impl AsRef<Path>) -> Result<(), AssetError> {
        self.runtime()?.resolver.write().set_root(root)?;
        Ok(())
    }
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, AssetError> {
        Ok(self.runtime()?.resolver.read().resolve(path))
    }
    pub fn set_hot_reload_enabled(&self, enabled: bool) -> Result<(), AssetError> {
        self.runtime()?.monitor.lock().set_enabled(enabled);
        Ok(())
    }
    pub fn hot_reload_enabled(&self) -> bool {
        self.runtime()
            .map(|runtime| runtime.monitor.lock().is_enabled())
            .unwrap_or(false)
    }
    /// Requests `path` as an asset of type `T`.
    ///
    /// Returns immediately with a handle to the asset's record. The first request
    /// for a path schedules a load, later ones share the record unless it failed,
    /// in which case the load is retried. Load failures are never returned here,
    /// they show up in the record's status and in the `Loaded` event.
    pub fn load<T: Asset>(&self, path: impl AsRef<Path>) -> Result<Handle<T>, AssetError> {
        self.load_with(path, LoadOptions::default())
    }
    pub fn load_with<T: Asset>(
        &self,
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<Handle<T>, AssetError> {
        let runtime = self.runtime()?;
        let (path, asset_dir) = {
            let resolver = runtime.resolver.read();
            (resolver.resolve(path), resolver.root().to_owned())
        };

        let shared = &self.inner.shared;
        let mut db = shared.db.lock();

        let (record, created) =
            db.get_or_create(&path, AssetType::of::<T>(), options.watch_for_hot_reload);
        let id = record.id;
        let handle = Handle::from_raw(RawHandle::strong(&record.counter));

        if created || record.status == LoadStatus::Failed {
            log::info!("Trying to load: {:?}", path);
            pipeline::schedule(shared, &asset_dir, &mut db, id);
        }

        Ok(handle)
    }
    /// Same as `load` but blocks the calling thread until the asset settled.
    /// Must not be called from inside a loader.
    pub fn load_sync<T: Asset>(&self, path: impl AsRef<Path>) -> Result<Handle<T>, AssetError> {
        let handle = self.load::<T>(path)?;
        self.wait_for(handle.id());
        Ok(handle)
    }
    /// Blocks until the asset is neither pending nor loading
    pub fn wait_for(&self, id: AssetId) {
        self.inner
            .shared
            .wait_settled(id, self.inner.config.sync_poll_interval());
    }
    /// Loads the asset again, returns false if a load is already in flight
    /// or the record doesn't exist anymore
    pub fn reload(&self, id: AssetId) -> Result<bool, AssetError> {
        let runtime = self.runtime()?;
        let asset_dir = runtime.asset_dir();

        let shared = &self.inner.shared;
        let mut db = shared.db.lock();
        let settled = db
            .get(id)
            .map(|record| record.status.is_settled())
            .unwrap_or(false);

        if settled {
            pipeline::schedule(shared, &asset_dir, &mut db, id);
        }

        Ok(settled)
    }
    /// Loaded value behind `handle`.
    ///
    /// `None` while the first load is in flight, after it failed, after the record
    /// was released or if the record holds a different asset type. A failed reload
    /// keeps returning the previous value.
    pub fn get<T: Asset>(&self, handle: &Handle<T>) -> Option<Arc<T>> {
        if !handle.is_valid() {
            return None;
        }
        self.payload(handle.id(), AssetType::of::<T>())?
            .downcast::<T>()
            .ok()
    }
    pub fn get_erased(&self, handle: &ErasedHandle) -> Option<ErasedAsset> {
        if !handle.is_valid() {
            return None;
        }
        self.payload(handle.id(), handle.asset_type())
    }
    fn payload(&self, id: AssetId, asset_type: AssetType) -> Option<ErasedAsset> {
        let db = self.inner.shared.db.lock();
        let record = db.get(id)?;
        if record.asset_type != asset_type {
            log::warn!(
                "{}",
                LoadError::TypeMismatch {
                    expected: asset_type.name(),
                    found: record.asset_type.name(),
                }
            );
            return None;
        }

        record.payload.clone()
    }
    /// Handle to an already known asset, checked against the record's type
    pub fn handle<T: Asset>(&self, id: AssetId) -> Option<Result<Handle<T>, LoadError>> {
        let db = self.inner.shared.db.lock();
        let record = db.get(id)?;
        let erased = ErasedHandle::from_raw(RawHandle::strong(&record.counter), record.asset_type);

        Some(erased.try_typed::<T>())
    }
    pub fn find<T: Asset>(&self, path: impl AsRef<Path>) -> Option<Handle<T>> {
        let path = self.resolve_path(path).ok()?;
        let id = self
            .inner
            .shared
            .db
            .lock()
            .find(&path, AssetType::of::<T>())?;
        self.handle::<T>(id)?.ok()
    }
    fn with_record<R>(&self, id: AssetId, f: impl FnOnce(&Record) -> R) -> Option<R> {
        self.inner.shared.db.lock().get(id).map(f)
    }
    pub fn status(&self, id: AssetId) -> Option<LoadStatus> {
        self.with_record(id, |record| record.status)
    }
    pub fn progress(&self, id: AssetId) -> Option<f32> {
        self.with_record(id, |record| record.progress)
    }
    pub fn error(&self, id: AssetId) -> Option<LoadError> {
        self.with_record(id, |record| record.error.clone()).flatten()
    }
    pub fn path_of(&self, id: AssetId) -> Option<PathBuf> {
        self.with_record(id, |record| record.path.clone())
    }
    pub fn ref_count(&self, id: AssetId) -> Option<usize> {
        self.with_record(id, |record| record.ref_count())
    }
    pub fn info(&self, id: AssetId) -> Option<AssetInfo> {
        self.with_record(id, |record| record.info())
    }
    pub fn set_hot_reload(&self, id: AssetId, watch: bool) -> bool {
        match self.inner.shared.db.lock().get_mut(id) {
            Some(record) => {
                record.watch = watch;
                true
            }
            None => false,
        }
    }
    pub fn asset_count(&self) -> usize {
        self.inner.shared.db.lock().len()
    }
    /// Number of assets pending or loading
    pub fn pending_count(&self) -> usize {
        self.inner.shared.db.lock().pending_count()
    }
    /// Mean progress of all pending and loading assets, 1.0 when there are none
    pub fn overall_progress(&self) -> f32 {
        self.inner.shared.db.lock().overall_progress()
    }
    /// Runs the hot reload monitor and publishes the notifications of every
    /// load that finished since the last call.
    pub fn update(&self) -> Result<(), AssetError> {
        let runtime = self.runtime()?;
        let shared = &self.inner.shared;

        let changed = runtime.monitor.lock().scan(shared);
        if !changed.is_empty() {
            let asset_dir = runtime.asset_dir();
            let mut db = shared.db.lock();
            for id in changed {
                let watchable = db
                    .get(id)
                    .map(|record| record.is_watchable())
                    .unwrap_or(false);
                if watchable {
                    pipeline::schedule(shared, &asset_dir, &mut db, id);
                }
            }
        }

        let (completions, pending) = {
            let db = shared.db.lock();
            (shared.drain_completions(), db.pending_count())
        };

        let mut events: Vec<AssetEvent> = Vec::with_capacity(completions.len() + 1);
        {
            let mut tracker = runtime.tracker.lock();
            for completion in completions {
                tracker.record(&completion);
                events.push(completion.into_event());
            }
            if let Some(settled) = tracker.finish_tick(pending) {
                log::debug!("All pending assets settled: {:?}", settled);
                events.push(settled);
            }
        }

        // Subscribers may call back into the manager
        let event_bus = runtime.event_bus.clone();
        drop(runtime);
        for event in events {
            event_bus.publish(event);
        }

        Ok(())
    }
    /// Releases every settled asset without handles. Returns how many were released.
    pub fn unload_unused(&self) -> Result<usize, AssetError> {
        let _runtime = self.runtime()?;
        let removed = self.inner.shared.db.lock().remove_unused();
        for record in &removed {
            log::debug!("Unloading unused asset {:?} ({})", record.path, record.id);
        }
        Ok(removed.len())
    }
    /// Releases every asset, referenced or not.
    ///
    /// Dangerous: every outstanding handle stops resolving, and loads in flight
    /// are discarded when they finish.
    pub fn clear_cache(&self) -> Result<usize, AssetError> {
        let _runtime = self.runtime()?;
        let cleared = self.inner.shared.db.lock().clear();
        log::warn!("Cleared asset cache, {} assets released", cleared);
        Ok(cleared)
    }
}
