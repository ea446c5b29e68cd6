//! Profiles: the subjects that policies talk about and tokens assert.
//!
//! A profile is identified by a stable [`ProfileId`] and carries a
//! human-chosen username. Usernames are not unique across the network, so
//! lookups by username return a list and callers decide what to do with
//! more than one match.
//!
//! Only profiles owned by this node hold a private key; remote profiles are
//! known by id and username alone.

mod error;
mod store;
mod types;

pub use error::{ProfileError, ProfileResult};
pub use store::{MemoryProfileStore, ProfileStore};
pub use types::{Profile, ProfileId};
