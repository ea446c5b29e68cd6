//! Datum Storage - backing persistence for stores that write through.
//!
//! A [`Filesystem`] is a minimal put/get abstraction:
//!
//! - `put(name, bytes)` stores a blob and returns the path it can be read
//!   back from
//! - `get(path)` returns the stored bytes
//!
//! Two implementations are provided:
//!
//! | Backend | Addressing | Use |
//! |---------|------------|-----|
//! | [`MemoryFilesystem`] | content (`/mem/<blake3>`) | tests, ephemeral nodes |
//! | [`LocalFilesystem`] | path (the `name` given to `put`) | on-disk state |
//!
//! Callers must always read back through the path returned by the most
//! recent `put`; with content addressing that path changes whenever the
//! content does.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod fs;
pub mod local;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use fs::Filesystem;
pub use local::LocalFilesystem;
pub use memory::{MEM_PREFIX, MemoryFilesystem};
