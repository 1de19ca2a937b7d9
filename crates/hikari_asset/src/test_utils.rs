use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tempfile::TempDir;

use crate::*;

#[derive(Debug)]
pub struct Texture {
    pub bytes: Vec<u8>,
}
impl Asset for Texture {
    const NAME: &'static str = "Texture";
}

#[derive(Debug)]
pub struct Shader {
    pub source: String,
}
impl Asset for Shader {
    const NAME: &'static str = "Shader";
}

/// Reads the file and needs at least 4 bytes. Counts calls and overlapping calls.
#[derive(Default, Clone)]
pub struct TextureLoader {
    pub calls: Arc<AtomicUsize>,
    pub active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
    pub delay: Duration,
    pub steps: Vec<f32>,
}

impl TextureLoader {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    fn decode(&self, ctx: &mut LoadContext) -> anyhow::Result<Texture> {
        for &step in &self.steps {
            ctx.set_progress(step);
            std::thread::sleep(self.delay / self.steps.len() as u32);
        }
        std::thread::sleep(self.delay);

        let bytes = ctx.read()?;
        if bytes.len() < 4 {
            anyhow::bail!("Texture needs at least 4 bytes, got {}", bytes.len());
        }
        Ok(Texture { bytes })
    }
}

impl Loader for TextureLoader {
    type Asset = Texture;

    fn extensions(&self) -> &[&str] {
        &["bin"]
    }
    fn load(&self, ctx: &mut LoadContext) -> anyhow::Result<Texture> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let result = self.decode(ctx);

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub struct ShaderLoader;

impl Loader for ShaderLoader {
    type Asset = Shader;

    fn extensions(&self) -> &[&str] {
        &["glsl"]
    }
    fn load(&self, ctx: &mut LoadContext) -> anyhow::Result<Shader> {
        let source = String::from_utf8(ctx.read()?)?;
        Ok(Shader { source })
    }
}

pub fn init_logger() {
    simple_logger::SimpleLogger::new().init().ok();
}

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub struct Fixture {
    pub dir: TempDir,
    pub manager: AssetManager,
    pub events: flume::Receiver<AssetEvent>,
}

impl Fixture {
    pub fn new(config: AssetConfig) -> Self {
        init_logger();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let manager = AssetManager::new(config);
        let (bus, events) = ChannelEventBus::new();
        manager
            .initialize(dir.path(), Arc::new(bus))
            .expect("Failed to initialize asset manager");

        Self {
            dir,
            manager,
            events,
        }
    }
    pub fn with_texture_loader(loader: TextureLoader) -> Self {
        let fixture = Self::new(AssetConfig {
            hot_reload_interval_ms: 0,
            ..Default::default()
        });
        fixture.manager.register_loader(loader);
        fixture
    }
    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write asset");
        path
    }
    /// Calls `update` until an event matching `predicate` shows up
    pub fn pump_until(&self, mut predicate: impl FnMut(&AssetEvent) -> bool) -> Option<AssetEvent> {
        let start = Instant::now();
        while start.elapsed() < TIMEOUT {
            self.manager.update().expect("update failed");
            for event in self.events.try_iter() {
                if predicate(&event) {
                    return Some(event);
                }
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }
    /// Like `AssetManager::wait_for` but gives up after `TIMEOUT`, returns whether the asset settled
    pub fn wait_settled(&self, id: AssetId) -> bool {
        let start = Instant::now();
        while start.elapsed() < TIMEOUT {
            match self.manager.status(id) {
                Some(status) if status.is_in_flight() => {
                    std::thread::sleep(Duration::from_millis(1))
                }
                _ => return true,
            }
        }
        false
    }
    /// Runs one `update` and returns the events it published
    pub fn tick(&self) -> Vec<AssetEvent> {
        self.manager.update().expect("update failed");
        self.events.try_iter().collect()
    }
}
