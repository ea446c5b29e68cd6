//! In-memory, content-addressed [`Filesystem`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use datum_crypto::ContentHash;

use crate::error::{StorageError, StorageResult};
use crate::fs::Filesystem;

/// Path prefix for blobs held by [`MemoryFilesystem`].
pub const MEM_PREFIX: &str = "/mem/";

/// Content-addressed blob store held in memory.
///
/// Also carries fault injection hooks so callers can exercise their
/// handling of failed or hanging writes.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_next_put: Mutex<Option<String>>,
    stall_puts: AtomicBool,
}

impl MemoryFilesystem {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful and failed `put` calls so far.
    #[must_use]
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `put` fail with the given message.
    pub fn fail_next_put(&self, message: impl Into<String>) {
        if let Ok(mut next) = self.fail_next_put.lock() {
            *next = Some(message.into());
        }
    }

    /// Make every `put` hang until the future is dropped.
    pub fn stall_puts(&self, stall: bool) {
        self.stall_puts.store(stall, Ordering::SeqCst);
    }
}

#[async_trait]
impl Filesystem for MemoryFilesystem {
    async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        blobs
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn put(&self, _name: &str, bytes: Vec<u8>) -> StorageResult<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        if self.stall_puts.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let injected = self
            .fail_next_put
            .lock()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .take();
        if let Some(message) = injected {
            return Err(StorageError::Internal(message));
        }

        let path = format!("{MEM_PREFIX}{}", ContentHash::hash(&bytes).to_hex());
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        blobs.insert(path.clone(), bytes);
        Ok(path)
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
