//! Datum Core - profile identities shared by the access and token crates.
//!
//! This crate provides:
//! - [`Profile`]: a subject with an id, a username and (for local
//!   profiles) a private key
//! - [`ProfileStore`]: the lookup collaborator used by policy enforcement
//!   call sites and the token provider
//! - [`MemoryProfileStore`]: an in-memory implementation

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod profile;

pub use profile::{MemoryProfileStore, Profile, ProfileError, ProfileId, ProfileResult, ProfileStore};
