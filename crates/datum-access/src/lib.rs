//! Datum Access - who may do what against a remote.
//!
//! This crate provides:
//! - [`Resource`] and [`Action`]: colon-delimited patterns with wildcard
//!   and subject-substitution segments
//! - [`Policy`]: an ordered list of allow/deny [`Rule`]s, loaded from a
//!   JSON document and evaluated with a default of deny
//!
//! # Evaluation
//!
//! Every rule is visited top to bottom. The effect of the **last** rule
//! that applies to the request is the decision, so narrow overrides are
//! written after the general rules they refine. A request no rule applies
//! to is denied.
//!
//! # Example
//!
//! ```
//! use datum_access::{AccessError, Policy};
//! use datum_core::Profile;
//!
//! let policy = Policy::default_policy();
//! let bob = Profile::new("QmBob", "bob");
//!
//! assert!(policy.enforce(&bob, "dataset:alice:census", "remote:pull").is_ok());
//! assert!(policy.enforce(&bob, "dataset:bob:census", "remote:remove").is_ok());
//! assert!(matches!(
//!     policy.enforce(&bob, "dataset:alice:census", "remote:remove"),
//!     Err(AccessError::AccessDenied)
//! ));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod pattern;
mod policy;

pub use error::{AccessError, AccessResult};
pub use pattern::{Action, Resource, SUBJECT_SEGMENT, WILDCARD_SEGMENT};
pub use policy::{Decision, Effect, Policy, Rule};
