//! Datum Crypto - key material for identity tokens.
//!
//! This crate provides:
//! - Key pairs over the supported signature families (Ed25519, RSA)
//! - Canonical key identifiers derived from public keys
//! - A key store mapping key identifiers to public keys, used to verify
//!   tokens issued by remote identities
//! - BLAKE3 content hashing
//!
//! # Example
//!
//! ```
//! use datum_crypto::{KeyPair, KeyStore, MemoryKeyStore};
//!
//! let keypair = KeyPair::generate_ed25519();
//! let store = MemoryKeyStore::new();
//!
//! let id = store.add_pub_key(keypair.public_key()).unwrap();
//! assert_eq!(id, keypair.key_id());
//! assert_eq!(store.pub_key(&id).unwrap(), keypair.public_key());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;
mod key_id;
mod keypair;
mod keystore;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use key_id::KeyId;
pub use keypair::{Ed25519KeyPair, KeyPair, KeyType, PublicKey, RsaKeyPair};
pub use keystore::{KeyStore, MemoryKeyStore};
