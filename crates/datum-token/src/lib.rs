//! Datum Token - signed bearer tokens asserting a profile's identity.
//!
//! This crate provides:
//! - [`TokenSource`]: issues tokens signed with a local key (`EdDSA` for
//!   Ed25519, `RS256` for RSA) and verifies its own tokens
//! - [`parse_token`]: verifies tokens from any issuer whose public key is in
//!   a [`KeyStore`](datum_crypto::KeyStore)
//! - [`TokenStore`]: keyed, write-through storage of raw token strings
//! - [`LocalProvider`]: password and refresh grants over local profiles
//! - [`AuthContext`]: the verified identity attached to one request
//!
//! Time is read from an injected [`Clock`]; expiry is checked lazily when a
//! token is parsed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use datum_core::Profile;
//! use datum_crypto::{KeyPair, KeyStore, MemoryKeyStore};
//! use datum_token::{ManualClock, TokenSource, parse_token};
//!
//! let clock = ManualClock::at_unix(1_700_000_000);
//! let key = KeyPair::generate_ed25519();
//! let source = TokenSource::new(&key, clock.shared()).unwrap();
//!
//! let raw = source
//!     .create_token(&Profile::new("QmAlice", "alice"), Duration::from_secs(60))
//!     .unwrap();
//!
//! let keys = MemoryKeyStore::new();
//! keys.add_pub_key(key.public_key()).unwrap();
//! let token = parse_token(&raw, &keys, &clock).unwrap();
//! assert_eq!(token.subject().as_str(), "QmAlice");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod claims;
mod clock;
mod context;
mod error;
mod jws;
mod provider;
mod source;
mod store;
mod verify;

pub use claims::{Claims, ClientType, NumericDate, Token};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use context::AuthContext;
pub use error::{TokenError, TokenResult};
pub use provider::{
    BEARER, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, GrantType, LocalProvider, TokenProvider,
    TokenRequest, TokenResponse,
};
pub use source::TokenSource;
pub use store::{ROOT_TOKEN_KEY, RawToken, TokenStore};
pub use verify::{decode_unverified, parse_token};

/// Token header types.
pub use jsonwebtoken::{Algorithm, Header};
