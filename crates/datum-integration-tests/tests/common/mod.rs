//! Shared fixtures for integration tests.

use std::sync::{Arc, OnceLock};

use datum_core::{MemoryProfileStore, Profile};
use datum_crypto::{KeyPair, KeyStore, MemoryKeyStore};
use datum_token::{LocalProvider, ManualClock};

/// Fixed start time for deterministic expiry.
pub const T0: i64 = 1_700_000_000;

/// The profile id used in the policy examples.
pub const BOB_ID: &str = "QmZePf5LeXow3RW5U1AgEiNbW46YnRGhZ7HPvm1UmPFPwt";

/// One RSA key per test binary; generation is slow.
#[allow(dead_code)]
pub fn rsa_key() -> Arc<KeyPair> {
    static KEY: OnceLock<Arc<KeyPair>> = OnceLock::new();
    KEY.get_or_init(|| Arc::new(KeyPair::generate_rsa(2048).unwrap()))
        .clone()
}

/// A node: one signing key shared by its profiles, the key store it trusts,
/// and a manual clock.
#[allow(dead_code)]
pub struct Node {
    /// Signing key.
    pub key: Arc<KeyPair>,
    /// Local profiles.
    pub profiles: Arc<MemoryProfileStore>,
    /// Public keys this node trusts.
    pub keys: Arc<MemoryKeyStore>,
    /// Clock shared with the provider.
    pub clock: ManualClock,
}

#[allow(dead_code)]
impl Node {
    /// A node with an Ed25519 key that trusts itself.
    pub fn ed25519() -> Self {
        Self::with_key(Arc::new(KeyPair::generate_ed25519()))
    }

    /// A node signing with `key` that trusts itself.
    pub fn with_key(key: Arc<KeyPair>) -> Self {
        let keys = Arc::new(MemoryKeyStore::new());
        keys.add_pub_key(key.public_key()).unwrap();
        Self {
            key,
            profiles: Arc::new(MemoryProfileStore::new()),
            keys,
            clock: ManualClock::at_unix(T0),
        }
    }

    /// Add a profile signed for by this node's key.
    pub fn add_profile(&self, id: &str, username: &str) -> Profile {
        let profile = Profile::new(id, username).with_shared_key(self.key.clone());
        self.profiles.add(profile.clone()).unwrap();
        profile
    }

    /// A provider over this node's profiles and keys.
    pub fn provider(&self) -> LocalProvider {
        LocalProvider::new(self.profiles.clone(), self.keys.clone(), self.clock.shared())
    }

    /// Trust another node's key.
    pub fn trust(&self, other: &Node) {
        self.keys.add_pub_key(other.key.public_key()).unwrap();
    }
}
