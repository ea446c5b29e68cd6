//! Key store: public keys of known identities, indexed by key id.
//!
//! Tokens name their signer in the `iss` claim. Verifying a token issued by
//! another node means looking that key id up here.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{CryptoError, CryptoResult};
use crate::key_id::KeyId;
use crate::keypair::PublicKey;

/// Lookup table from key id to public key.
///
/// Implementations must be safe to share across threads; verification
/// paths call [`pub_key`](KeyStore::pub_key) concurrently.
pub trait KeyStore: Send + Sync {
    /// Get the public key stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] when no key is stored for `id`.
    fn pub_key(&self, id: &KeyId) -> CryptoResult<PublicKey>;

    /// Store a public key under its canonical id, returning that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn add_pub_key(&self, key: PublicKey) -> CryptoResult<KeyId>;

    /// Remove a key. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn remove(&self, id: &KeyId) -> CryptoResult<bool>;

    /// All stored key ids, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn key_ids(&self) -> CryptoResult<Vec<KeyId>>;
}

/// In-memory key store.
///
/// # Example
///
/// ```
/// use datum_crypto::{KeyPair, KeyStore, MemoryKeyStore};
///
/// let remote = KeyPair::generate_ed25519();
/// let store = MemoryKeyStore::new();
/// let id = store.add_pub_key(remote.public_key()).unwrap();
///
/// assert!(store.pub_key(&id).is_ok());
/// assert!(store.remove(&id).unwrap());
/// assert!(store.pub_key(&id).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: RwLock<BTreeMap<KeyId, PublicKey>>,
}

impl MemoryKeyStore {
    /// Create an empty key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with keys.
    #[must_use]
    pub fn with_keys(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        let keys = keys.into_iter().map(|k| (k.key_id(), k)).collect();
        Self {
            keys: RwLock::new(keys),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyStore for MemoryKeyStore {
    fn pub_key(&self, id: &KeyId) -> CryptoResult<PublicKey> {
        let keys = self
            .keys
            .read()
            .map_err(|e| CryptoError::KeyStore(e.to_string()))?;
        keys.get(id)
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound(id.to_string()))
    }

    fn add_pub_key(&self, key: PublicKey) -> CryptoResult<KeyId> {
        let id = key.key_id();
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CryptoError::KeyStore(e.to_string()))?;
        keys.insert(id.clone(), key);
        tracing::debug!(key_id = %id.short(), "added public key");
        Ok(id)
    }

    fn remove(&self, id: &KeyId) -> CryptoResult<bool> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CryptoError::KeyStore(e.to_string()))?;
        Ok(keys.remove(id).is_some())
    }

    fn key_ids(&self) -> CryptoResult<Vec<KeyId>> {
        let keys = self
            .keys
            .read()
            .map_err(|e| CryptoError::KeyStore(e.to_string()))?;
        Ok(keys.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn test_add_and_lookup() {
        let store = MemoryKeyStore::new();
        let kp = KeyPair::generate_ed25519();

        let id = store.add_pub_key(kp.public_key()).unwrap();
        assert_eq!(id, kp.key_id());
        assert_eq!(store.pub_key(&id).unwrap(), kp.public_key());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let store = MemoryKeyStore::new();
        let id = KeyPair::generate_ed25519().key_id();
        assert!(matches!(
            store.pub_key(&id),
            Err(CryptoError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let kp = KeyPair::generate_ed25519();
        let store = MemoryKeyStore::with_keys([kp.public_key()]);

        assert!(store.remove(&kp.key_id()).unwrap());
        assert!(!store.remove(&kp.key_id()).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_key_ids_sorted() {
        let keys: Vec<_> = (0..5)
            .map(|_| KeyPair::generate_ed25519().public_key())
            .collect();
        let store = MemoryKeyStore::with_keys(keys);

        let ids = store.key_ids().unwrap();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 5);
    }
}
