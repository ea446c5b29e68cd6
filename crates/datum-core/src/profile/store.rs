use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::error::{ProfileError, ProfileResult};
use super::types::{Profile, ProfileId};

/// Lookup of profiles by id and by username.
///
/// Implementations must be safe to share across tasks.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// All profiles carrying `username`. Usernames are not unique, so the
    /// result may hold zero, one or several profiles.
    async fn profiles_for_username(&self, username: &str) -> ProfileResult<Vec<Profile>>;

    /// The profile with the given id.
    async fn get_profile(&self, id: &ProfileId) -> ProfileResult<Profile>;
}

/// In-memory profile store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in an Arc for sharing.
    #[must_use]
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Insert a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if a profile with the same id is already stored.
    pub fn add(&self, profile: Profile) -> ProfileResult<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|e| ProfileError::Internal(e.to_string()))?;
        if profiles.contains_key(&profile.id) {
            return Err(ProfileError::AlreadyExists(profile.id.to_string()));
        }
        tracing::debug!(id = %profile.id, username = %profile.username, "added profile");
        profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Remove a profile. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn remove(&self, id: &ProfileId) -> ProfileResult<bool> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|e| ProfileError::Internal(e.to_string()))?;
        Ok(profiles.remove(id).is_some())
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn profiles_for_username(&self, username: &str) -> ProfileResult<Vec<Profile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| ProfileError::Internal(e.to_string()))?;
        let mut found: Vec<Profile> = profiles
            .values()
            .filter(|p| p.username == username)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn get_profile(&self, id: &ProfileId) -> ProfileResult<Profile> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| ProfileError::Internal(e.to_string()))?;
        profiles
            .get(id)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_username() {
        let store = MemoryProfileStore::new();
        store.add(Profile::new("QmA", "alice")).unwrap();
        store.add(Profile::new("QmB", "bob")).unwrap();
        store.add(Profile::new("QmB2", "bob")).unwrap();

        let bobs = store.profiles_for_username("bob").await.unwrap();
        assert_eq!(bobs.len(), 2);
        assert_eq!(bobs[0].id.as_str(), "QmB");

        assert!(store.profiles_for_username("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_profile() {
        let store = MemoryProfileStore::new();
        store.add(Profile::new("QmA", "alice")).unwrap();

        let p = store.get_profile(&ProfileId::new("QmA")).await.unwrap();
        assert_eq!(p.username, "alice");

        let missing = store.get_profile(&ProfileId::new("QmZ")).await;
        assert!(matches!(missing, Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = MemoryProfileStore::new();
        store.add(Profile::new("QmA", "alice")).unwrap();
        assert!(matches!(
            store.add(Profile::new("QmA", "other")),
            Err(ProfileError::AlreadyExists(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = MemoryProfileStore::new();
        store.add(Profile::new("QmA", "alice")).unwrap();
        assert!(store.remove(&ProfileId::new("QmA")).unwrap());
        assert!(!store.remove(&ProfileId::new("QmA")).unwrap());
        assert!(store.is_empty());
    }
}
