//! Path-addressed [`Filesystem`] rooted at a local directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::fs::Filesystem;

/// Stores blobs as files below a root directory.
///
/// `put(name, ..)` writes `root/name` and returns `name`. Names must be
/// relative and may not climb out of the root.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    /// Create a filesystem rooted at `root`. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        let rel = Path::new(name);
        let escapes = name.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::InvalidPath(name.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

fn not_found_or_io(path: &str, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| not_found_or_io(path, e))
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> StorageResult<String> {
        let full = self.resolve(name)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        tracing::trace!(path = %full.display(), "wrote blob");
        Ok(name.to_string())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| not_found_or_io(path, e))
    }
}
