//! Prelude module - commonly used types for convenient import.
//!
//! Use `use datum_access::prelude::*;` to import all essential types.

// Errors
pub use crate::{AccessError, AccessResult};

// Patterns
pub use crate::{Action, Resource};

// Policy
pub use crate::{Decision, Effect, Policy, Rule};
