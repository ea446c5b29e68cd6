//! Prelude module - commonly used types for convenient import.
//!
//! Use `use datum_core::prelude::*;` to import all essential types.

pub use crate::{MemoryProfileStore, Profile, ProfileError, ProfileId, ProfileResult, ProfileStore};
