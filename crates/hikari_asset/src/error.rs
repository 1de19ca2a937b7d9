use std::path::{Path, PathBuf};

use hikari_path::PathError;
use thiserror::Error;

/// Failure of a single load attempt, kept on the asset record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),
    #[error("No loader registered for asset type {0}")]
    LoaderMissing(&'static str),
    #[error("Loader failed: {0}")]
    LoaderFailure(String),
    #[error("Asset type mismatch, expected {expected} but record holds {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl LoadError {
    /// Maps a loader's error chain onto the load error kinds.
    /// Missing files surfacing from inside the loader are still reported as `NotFound`.
    pub(crate) fn from_loader(path: &Path, err: anyhow::Error) -> Self {
        let not_found = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
            .any(|io| io.kind() == std::io::ErrorKind::NotFound);

        if not_found {
            LoadError::NotFound(path.to_owned())
        } else {
            LoadError::LoaderFailure(format!("{:#}", err))
        }
    }
}

/// Errors reported synchronously to the caller of an `AssetManager` operation
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset manager used before being initialized")]
    NotInitialized,
    #[error("Asset manager is already initialized")]
    AlreadyInitialized,
    #[error("Asset manager has been shut down")]
    ShutDown,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Invalid asset config: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("Couldn't read asset config: {0}")]
    Io(#[from] std::io::Error),
}
