//! Prelude module - commonly used types for convenient import.
//!
//! Use `use datum_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Key types
pub use crate::{KeyId, KeyPair, KeyType, PublicKey};

// Key store
pub use crate::{KeyStore, MemoryKeyStore};

// Hashing
pub use crate::ContentHash;
