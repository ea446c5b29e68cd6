//! The [`Filesystem`] trait.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Put/get blob storage.
///
/// Implementations decide how paths are assigned: content-addressed
/// backends ignore `name` and derive the path from the bytes, path-addressed
/// backends store under `name`.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read the blob at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound)
    /// if nothing is stored at `path`.
    async fn get(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Store `bytes`, returning the path to read them back from.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> StorageResult<String>;

    /// Delete the blob at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound)
    /// if nothing is stored at `path`.
    async fn delete(&self, path: &str) -> StorageResult<()>;
}
