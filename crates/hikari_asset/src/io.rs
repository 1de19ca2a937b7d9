use std::{path::Path, time::SystemTime};

/// Snapshot of the file properties hot reloading compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub modified: Option<SystemTime>,
    pub size: u64,
}

/// File system access used by loaders and the hot reload monitor
pub trait IO: Send + Sync + 'static {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;
    fn metadata(&self, path: &Path) -> Result<FileMeta, std::io::Error>;

    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }
    fn last_modified(&self, path: &Path) -> Result<Option<SystemTime>, std::io::Error> {
        Ok(self.metadata(path)?.modified)
    }
    fn file_size(&self, path: &Path) -> Result<u64, std::io::Error> {
        Ok(self.metadata(path)?.size)
    }
}

pub struct PhysicalIO;

impl IO for PhysicalIO {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta, std::io::Error> {
        let metadata = std::fs::metadata(path)?;

        Ok(FileMeta {
            // Some platforms can't report modification times, size alone still catches most edits
            modified: metadata.modified().ok(),
            size: metadata.len(),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
