use std::{
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use hikari_handle::AssetId;
use parking_lot::{Condvar, Mutex};

use crate::{
    asset::ErasedAsset,
    db::AssetDB,
    events::{Completion, LoadEvent},
    record::{Record, MAX_INTERMEDIATE_PROGRESS, STARTED_PROGRESS},
    AssetType, DynLoader, FileMeta, LoadContext, LoadError, LoadStatus, LoaderRegistry, IO,
};

/// State shared between the manager and its load tasks
pub(crate) struct Shared {
    pub db: Mutex<AssetDB>,
    /// Signalled every time a record settles
    settled: Condvar,
    pub registry: LoaderRegistry,
    pub io: Arc<dyn IO>,
    completion_send: flume::Sender<Completion>,
    completion_recv: flume::Receiver<Completion>,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    pub fn new(io: Arc<dyn IO>) -> Self {
        let (completion_send, completion_recv) = flume::unbounded();
        Self {
            db: Mutex::new(AssetDB::new()),
            settled: Condvar::new(),
            registry: LoaderRegistry::new(),
            io,
            completion_send,
            completion_recv,
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
        }
    }
    /// Must be called with the db lock held so the pending count matches the drained completions
    pub fn drain_completions(&self) -> Vec<Completion> {
        self.completion_recv.try_iter().collect()
    }
    /// Publishes the settled state of `record`. The caller holds the db lock.
    fn complete(&self, record: &Record) {
        let completion = Completion {
            event: LoadEvent {
                id: record.id,
                path: record.path.clone(),
                type_name: record.asset_type.name(),
                error: record.error.clone(),
            },
            reload: record.reloading,
        };
        if self.completion_send.send(completion).is_err() {
            log::error!("Failed to enqueue load completion for {:?}", record.path);
        }
        self.settled.notify_all();
    }
    /// Blocks until the record leaves Pending/Loading or disappears.
    /// The db lock is released while waiting.
    pub fn wait_settled(&self, id: AssetId, poll_interval: Duration) {
        let mut db = self.db.lock();
        while db
            .get(id)
            .map(|record| record.status.is_in_flight())
            .unwrap_or(false)
        {
            self.settled.wait_for(&mut db, poll_interval);
        }
    }
    /// Blocks until every spawned load task has returned
    pub fn wait_idle(&self) {
        let mut in_flight = self.in_flight.lock();
        while *in_flight > 0 {
            self.idle.wait(&mut in_flight);
        }
    }
    pub fn tasks_in_flight(&self) -> usize {
        *self.in_flight.lock()
    }
}

struct TaskGuard {
    shared: Arc<Shared>,
}
impl TaskGuard {
    fn new(shared: &Arc<Shared>) -> Self {
        *shared.in_flight.lock() += 1;
        Self {
            shared: shared.clone(),
        }
    }
}
impl Drop for TaskGuard {
    fn drop(&mut self) {
        let mut in_flight = self.shared.in_flight.lock();
        *in_flight -= 1;
        if *in_flight == 0 {
            self.shared.idle.notify_all();
        }
    }
}

/// Starts a load attempt for record `id` on a thread of its own.
///
/// Brand new records stay Pending until their thread starts, retries and
/// reloads go straight to Loading. A missing loader fails the record on the spot.
/// Loaders may block on other assets, so attempts never queue behind each other.
/// The caller holds the db lock and must only pass records that aren't in flight,
/// or freshly created ones.
pub(crate) fn schedule(
    shared: &Arc<Shared>,
    asset_dir: &Path,
    db: &mut AssetDB,
    id: AssetId,
) {
    let Some(record) = db.get_mut(id) else {
        return;
    };

    record.reloading = record.payload.is_some();
    record.error = None;
    record.progress = 0.0;
    if record.status.is_settled() {
        record.status = LoadStatus::Loading;
    }

    let Some(loader) = shared.registry.resolve(&record.asset_type) else {
        let error = LoadError::LoaderMissing(record.asset_type.name());
        log::error!("Failed to load asset {:?}: {}", record.path, error);

        record.status = LoadStatus::Failed;
        record.error = Some(error);
        shared.complete(record);
        return;
    };

    if !loader.supports_extension(&record.path) {
        log::warn!(
            "Loader {} doesn't list the extension of {:?}, trying anyway",
            loader.type_name(),
            record.path
        );
    }

    let task = LoadTask {
        id,
        path: record.path.clone(),
        asset_type: record.asset_type,
        asset_dir: asset_dir.to_owned(),
        reload: record.reloading,
        loader,
        guard: TaskGuard::new(shared),
    };

    let spawned = std::thread::Builder::new()
        .name(format!("hikari-asset-load-{}", id.raw()))
        .spawn(move || task.run());

    if let Err(err) = spawned {
        log::error!("Failed to spawn load thread for {:?}: {}", record.path, err);

        record.status = LoadStatus::Failed;
        record.progress = 0.0;
        record.error = Some(LoadError::LoaderFailure(format!(
            "Failed to spawn load thread: {}",
            err
        )));
        shared.complete(record);
    }
}

struct LoadTask {
    id: AssetId,
    path: PathBuf,
    asset_type: AssetType,
    asset_dir: PathBuf,
    reload: bool,
    loader: Arc<dyn DynLoader>,
    guard: TaskGuard,
}

impl LoadTask {
    fn shared(&self) -> &Arc<Shared> {
        &self.guard.shared
    }
    fn run(self) {
        if !self.begin() {
            log::debug!("Asset {} was released before its load started", self.id);
            return;
        }

        // Stat before reading so an edit racing the load triggers another reload
        let file = self.shared().io.metadata(&self.path).ok();
        let result = self.load();
        self.finish(file, result);
    }
    fn begin(&self) -> bool {
        let mut db = self.shared().db.lock();
        match db.get_mut(self.id) {
            Some(record) => {
                record.status = LoadStatus::Loading;
                record.progress = record.progress.max(STARTED_PROGRESS);
                true
            }
            None => false,
        }
    }
    fn load(&self) -> Result<ErasedAsset, LoadError> {
        let shared = self.shared();
        if !shared.io.exists(&self.path) {
            return Err(LoadError::NotFound(self.path.clone()));
        }

        let id = self.id;
        let report = move |progress: f32| {
            let mut db = shared.db.lock();
            if let Some(record) = db.get_mut(id) {
                if record.status == LoadStatus::Loading {
                    record.progress = progress
                        .max(record.progress)
                        .min(MAX_INTERMEDIATE_PROGRESS);
                }
            }
        };

        let mut ctx = LoadContext::new(
            &self.path,
            &self.asset_dir,
            &*shared.io,
            self.reload,
            &report,
        );

        match std::panic::catch_unwind(AssertUnwindSafe(|| self.loader.load_erased(&mut ctx))) {
            Ok(Ok(asset)) => Ok(asset),
            Ok(Err(err)) => Err(LoadError::from_loader(&self.path, err)),
            Err(_) => Err(LoadError::LoaderFailure(format!(
                "Loader {} panicked",
                self.loader.type_name()
            ))),
        }
    }
    fn finish(&self, file: Option<FileMeta>, result: Result<ErasedAsset, LoadError>) {
        let shared = self.shared();
        let mut db = shared.db.lock();

        let Some(record) = db.get_mut(self.id) else {
            log::debug!(
                "Discarding load result for released asset {:?} ({})",
                self.path,
                self.asset_type
            );
            return;
        };

        record.file = file;
        match result {
            Ok(asset) => {
                log::info!("Loaded {:?}", record.path);
                record.payload = Some(asset);
                record.status = LoadStatus::Loaded;
                record.progress = 1.0;
                record.error = None;
            }
            Err(error) => {
                if self.reload {
                    log::error!(
                        "Failed to reload asset {:?}, keeping previous version: {}",
                        record.path,
                        error
                    );
                } else {
                    log::error!("Failed to load asset {:?}: {}", record.path, error);
                }
                // A previous payload stays in place, handles keep seeing the last good version
                record.status = LoadStatus::Failed;
                record.progress = 0.0;
                record.error = Some(error);
            }
        }

        shared.complete(record);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::Ordering, time::Instant};

    use crate::{test_utils::*, Asset, Loader};

    use super::*;

    struct Exploding;
    impl Asset for Exploding {
        const NAME: &'static str = "Exploding";
    }

    struct ExplodingLoader;
    impl Loader for ExplodingLoader {
        type Asset = Exploding;

        fn extensions(&self) -> &[&str] {
            &["boom"]
        }
        fn load(&self, _ctx: &mut LoadContext) -> anyhow::Result<Exploding> {
            panic!("corrupt data")
        }
    }

    #[test]
    fn progress_is_monotonic() {
        let loader = TextureLoader {
            steps: vec![0.3, 0.2, 0.6, 5.0],
            delay: Duration::from_millis(80),
            ..Default::default()
        };
        let fixture = Fixture::with_texture_loader(loader);
        fixture.write("a.bin", b"abcd");

        let handle = fixture.manager.load::<Texture>("a.bin").unwrap();
        let id = handle.id();

        let start = Instant::now();
        let mut samples = vec![fixture.manager.progress(id).unwrap()];
        while fixture.manager.status(id).unwrap().is_in_flight() && start.elapsed() < TIMEOUT {
            let progress = fixture.manager.progress(id).unwrap();
            if fixture.manager.status(id).unwrap().is_in_flight() {
                assert!(progress < 1.0);
            }
            samples.push(progress);
            std::thread::sleep(Duration::from_millis(1));
        }
        samples.push(fixture.manager.progress(id).unwrap());

        assert_eq!(fixture.manager.status(id), Some(LoadStatus::Loaded));
        assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", samples);
        assert_eq!(samples.last(), Some(&1.0));
    }

    #[test]
    fn one_load_in_flight_per_asset() {
        let loader = TextureLoader::slow(Duration::from_millis(20));
        let fixture = Fixture::with_texture_loader(loader.clone());
        fixture.write("a.bin", b"abcd");

        let id = fixture.manager.load::<Texture>("a.bin").unwrap().id();
        let manager = &fixture.manager;

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        let _handle = manager.load::<Texture>("a.bin").unwrap();
                        manager.reload(id).unwrap();
                        std::thread::sleep(Duration::from_millis(2));
                    }
                });
            }
        });
        manager.wait_for(id);
        manager.shutdown().unwrap();

        assert!(loader.calls() >= 1);
        assert_eq!(loader.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reload_is_refused_while_in_flight() {
        let fixture = Fixture::with_texture_loader(TextureLoader::slow(Duration::from_millis(50)));
        fixture.write("a.bin", b"abcd");

        let handle = fixture.manager.load::<Texture>("a.bin").unwrap();
        assert!(!fixture.manager.reload(handle.id()).unwrap());

        fixture.manager.wait_for(handle.id());
        assert!(fixture.manager.reload(handle.id()).unwrap());
        assert_eq!(fixture.manager.status(handle.id()), Some(LoadStatus::Loading));
        assert!(fixture.manager.get(&handle).is_some());
    }

    #[test]
    fn loader_panic_fails_the_asset() {
        let fixture = Fixture::with_texture_loader(TextureLoader::default());
        fixture.manager.register_loader(ExplodingLoader);
        fixture.write("a.boom", b"abcd");

        let handle = fixture.manager.load_sync::<Exploding>("a.boom").unwrap();

        assert_eq!(fixture.manager.status(handle.id()), Some(LoadStatus::Failed));
        match fixture.manager.error(handle.id()) {
            Some(LoadError::LoaderFailure(message)) => assert!(message.contains("panicked")),
            other => panic!("Unexpected error {:?}", other),
        }
    }

    #[test]
    fn released_record_discards_result() {
        let fixture = Fixture::with_texture_loader(TextureLoader::slow(Duration::from_millis(50)));
        fixture.write("a.bin", b"abcd");

        let handle = fixture.manager.load::<Texture>("a.bin").unwrap();
        fixture.manager.clear_cache().unwrap();
        fixture.manager.shutdown().unwrap();

        assert!(fixture.manager.status(handle.id()).is_none());
        assert!(fixture.manager.get(&handle).is_none());
    }
}
