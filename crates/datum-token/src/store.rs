//! Persistent store of raw token strings.
//!
//! Tokens are kept by an opaque caller-chosen key (the local owner's token
//! lives under [`ROOT_TOKEN_KEY`], tokens for a remote under its URL). The
//! whole set is written to the backing [`Filesystem`] as a JSON list on
//! every change.

use std::collections::BTreeMap;
use std::sync::Arc;

use datum_storage::{Filesystem, StorageError};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{TokenError, TokenResult};
use crate::verify::decode_unverified;

/// Key under which the local owner's token is stored.
pub const ROOT_TOKEN_KEY: &str = "_root";

/// One stored token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    /// Caller-chosen label.
    pub key: String,
    /// Compact token string.
    pub raw: String,
}

struct Backing {
    fs: Arc<dyn Filesystem>,
    name: String,
}

#[derive(Default)]
struct State {
    tokens: BTreeMap<String, String>,
    /// Path returned by the last successful write.
    path: Option<String>,
}

/// Keyed token storage with write-through persistence.
///
/// Writers hold an exclusive lock across the change and its persistence.
/// The in-memory set is only replaced once the write has succeeded, so a
/// failed or cancelled write leaves the store as it was.
pub struct TokenStore {
    state: RwLock<State>,
    backing: Option<Backing>,
}

impl TokenStore {
    /// A store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(State::default()),
            backing: None,
        }
    }

    /// Open a store persisted at `path` on `fs`, loading any tokens already
    /// written there. A missing file opens an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Cancelled`] if `cancel` fires during the read,
    /// a storage error if the read fails, or a serialization error if the
    /// stored list is corrupt.
    pub async fn open(
        fs: Arc<dyn Filesystem>,
        path: impl Into<String>,
        cancel: &CancellationToken,
    ) -> TokenResult<Self> {
        let path = path.into();

        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TokenError::Cancelled),
            read = fs.get(&path) => read,
        };

        let (tokens, existing) = match read {
            Ok(bytes) => {
                let list: Vec<RawToken> = serde_json::from_slice(&bytes)?;
                let tokens = list.into_iter().map(|t| (t.key, t.raw)).collect();
                (tokens, Some(path.clone()))
            },
            Err(StorageError::NotFound(_)) => (BTreeMap::new(), None),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path, count = tokens.len(), "opened token store");

        Ok(Self {
            state: RwLock::new(State {
                tokens,
                path: existing,
            }),
            backing: Some(Backing { fs, name: path }),
        })
    }

    /// Path of the last persisted copy, if any.
    pub async fn path(&self) -> Option<String> {
        self.state.read().await.path.clone()
    }

    /// Store `raw` under `key`, replacing any previous token.
    ///
    /// The token must be structurally well formed; its signature is not
    /// checked.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] for a malformed token,
    /// [`TokenError::Cancelled`] if `cancel` fires, or the storage error if
    /// persistence fails.
    pub async fn put_token(
        &self,
        key: impl Into<String>,
        raw: impl Into<String>,
        cancel: &CancellationToken,
    ) -> TokenResult<()> {
        let key = key.into();
        let raw = raw.into();
        decode_unverified(&raw)?;

        let mut state = lock_write(&self.state, cancel).await?;
        let mut next = state.tokens.clone();
        next.insert(key.clone(), raw);

        let path = self.persist(&next, cancel).await?;
        state.tokens = next;
        if path.is_some() {
            state.path = path;
        }

        tracing::debug!(key = %key, "stored token");
        Ok(())
    }

    /// The token stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenNotFound`] if nothing is stored under
    /// `key`, or [`TokenError::Cancelled`].
    pub async fn raw_token(&self, key: &str, cancel: &CancellationToken) -> TokenResult<String> {
        let state = lock_read(&self.state, cancel).await?;
        state
            .tokens
            .get(key)
            .cloned()
            .ok_or(TokenError::TokenNotFound)
    }

    /// Remove the token stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::TokenNotFound`] if nothing is stored under
    /// `key`, [`TokenError::Cancelled`], or the storage error if
    /// persistence fails.
    pub async fn delete_token(&self, key: &str, cancel: &CancellationToken) -> TokenResult<()> {
        let mut state = lock_write(&self.state, cancel).await?;
        if !state.tokens.contains_key(key) {
            return Err(TokenError::TokenNotFound);
        }

        let mut next = state.tokens.clone();
        next.remove(key);

        let path = self.persist(&next, cancel).await?;
        state.tokens = next;
        if path.is_some() {
            state.path = path;
        }

        tracing::debug!(key = %key, "deleted token");
        Ok(())
    }

    /// Tokens in ascending key order, skipping the first `offset` and
    /// returning at most `limit`. A `limit` of zero or less means no limit.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Cancelled`].
    pub async fn list_tokens(
        &self,
        offset: usize,
        limit: i64,
        cancel: &CancellationToken,
    ) -> TokenResult<Vec<RawToken>> {
        let state = lock_read(&self.state, cancel).await?;
        let take = usize::try_from(limit)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(usize::MAX);

        Ok(state
            .tokens
            .iter()
            .skip(offset)
            .take(take)
            .map(|(key, raw)| RawToken {
                key: key.clone(),
                raw: raw.clone(),
            })
            .collect())
    }

    /// Number of stored tokens.
    pub async fn len(&self) -> usize {
        self.state.read().await.tokens.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn persist(
        &self,
        tokens: &BTreeMap<String, String>,
        cancel: &CancellationToken,
    ) -> TokenResult<Option<String>> {
        let Some(backing) = &self.backing else {
            return Ok(None);
        };

        let list: Vec<RawToken> = tokens
            .iter()
            .map(|(key, raw)| RawToken {
                key: key.clone(),
                raw: raw.clone(),
            })
            .collect();
        let bytes = serde_json::to_vec_pretty(&list)?;

        let written = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TokenError::Cancelled),
            written = backing.fs.put(&backing.name, bytes) => written.map_err(TokenError::from),
        };

        match written {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                tracing::warn!(name = %backing.name, error = %e, "failed to persist token store");
                Err(e)
            },
        }
    }
}

async fn lock_write<'a>(
    lock: &'a RwLock<State>,
    cancel: &CancellationToken,
) -> TokenResult<tokio::sync::RwLockWriteGuard<'a, State>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(TokenError::Cancelled),
        guard = lock.write() => Ok(guard),
    }
}

async fn lock_read<'a>(
    lock: &'a RwLock<State>,
    cancel: &CancellationToken,
) -> TokenResult<tokio::sync::RwLockReadGuard<'a, State>> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(TokenError::Cancelled),
        guard = lock.read() => Ok(guard),
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("persisted", &self.backing.as_ref().map(|b| b.name.as_str()))
            .finish_non_exhaustive()
    }
}
