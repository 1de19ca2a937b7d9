use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Asset root cannot be empty")]
    EmptyRoot,
    #[error("Couldn't make asset root {0:?} absolute: {1}")]
    UnresolvableRoot(PathBuf, std::io::Error),
}

/// Lexically normalizes `path`, folding `.` and `..` segments.
///
/// No filesystem access happens here, symlinks are not followed.
/// A `..` at the root of an absolute path is dropped, on relative paths it is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().map(|c| c.as_os_str()).collect()
}

/// Resolves user supplied asset paths against an absolute root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// A relative root is made absolute using the current working directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PathError> {
        Ok(Self {
            root: Self::absolute_root(root.as_ref())?,
        })
    }
    fn absolute_root(root: &Path) -> Result<PathBuf, PathError> {
        if root.as_os_str().is_empty() {
            return Err(PathError::EmptyRoot);
        }

        let root = if root.is_absolute() {
            root.to_owned()
        } else {
            std::env::current_dir()
                .map_err(|err| PathError::UnresolvableRoot(root.to_owned(), err))?
                .join(root)
        };

        Ok(normalize(&root))
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    /// Changing the root only affects paths resolved afterwards
    pub fn set_root(&mut self, root: impl AsRef<Path>) -> Result<(), PathError> {
        let root = Self::absolute_root(root.as_ref())?;
        log::info!("Asset root changed from {:?} to {:?}", self.root, root);
        self.root = root;

        Ok(())
    }
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root.join(path))
        }
    }
    /// Path of `path` relative to the root, if it lives under it
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        normalize(path)
            .strip_prefix(&self.root)
            .ok()
            .map(|path| path.to_owned())
    }
}
