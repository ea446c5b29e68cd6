//! CLI commands.

pub(crate) mod access;
pub(crate) mod config;
pub(crate) mod keys;
pub(crate) mod token;
