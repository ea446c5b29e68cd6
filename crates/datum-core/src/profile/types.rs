use std::fmt;
use std::sync::Arc;

use datum_crypto::{KeyPair, PublicKey};
use serde::{Deserialize, Serialize};

/// Stable identifier of a profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Create a profile id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProfileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A subject identity.
#[derive(Clone)]
pub struct Profile {
    /// Stable identifier.
    pub id: ProfileId,
    /// Human-chosen name; substituted for `_subject` in resource patterns.
    pub username: String,
    /// Signing key, present only for profiles owned by this node.
    pub private_key: Option<Arc<KeyPair>>,
}

impl Profile {
    /// Create a profile without key material.
    #[must_use]
    pub fn new(id: impl Into<ProfileId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            private_key: None,
        }
    }

    /// Attach a private key.
    #[must_use]
    pub fn with_private_key(mut self, key: KeyPair) -> Self {
        self.private_key = Some(Arc::new(key));
        self
    }

    /// Attach a shared private key.
    #[must_use]
    pub fn with_shared_key(mut self, key: Arc<KeyPair>) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Public half of the profile's key, if it holds one.
    #[must_use]
    pub fn public_key(&self) -> Option<PublicKey> {
        self.private_key.as_ref().map(|k| k.public_key())
    }

    /// Whether this profile can sign tokens.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.username, self.id)
    }
}
