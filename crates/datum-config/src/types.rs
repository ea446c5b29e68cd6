//! Configuration types for datum.
//!
//! All types in this module are self-contained with no dependencies on other
//! internal datum crates. Paths and key types stay as strings here and are
//! converted at the boundary. Every struct implements [`Default`] with the
//! same values as the embedded `defaults.toml`, so a bare `[section]` header
//! produces a working configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Access policy source and enforcement switch.
    pub access: AccessSection,
    /// Token lifetimes and the token store location.
    pub tokens: TokensSection,
    /// Node signing key.
    pub keys: KeysSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// AccessSection
// ---------------------------------------------------------------------------

/// Where the access policy comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSection {
    /// Path to a JSON policy document. `None` uses the built-in default
    /// policy.
    pub policy_path: Option<String>,
    /// Whether remote requests are checked against the policy at all.
    pub enforce: bool,
}

impl Default for AccessSection {
    fn default() -> Self {
        Self {
            policy_path: None,
            enforce: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TokensSection
// ---------------------------------------------------------------------------

/// Token lifetimes and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensSection {
    /// Lifetime of access tokens, in seconds.
    pub access_ttl_secs: u64,
    /// Lifetime of refresh tokens, in seconds.
    pub refresh_ttl_secs: u64,
    /// Token store file, relative to the datum home directory unless
    /// absolute.
    pub store_path: String,
}

impl Default for TokensSection {
    fn default() -> Self {
        Self {
            access_ttl_secs: 2 * 60 * 60,
            refresh_ttl_secs: 30 * 24 * 60 * 60,
            store_path: "tokens.json".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// KeysSection
// ---------------------------------------------------------------------------

/// Node signing key location and algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysSection {
    /// Key file. `None` uses `node.key` in the datum home directory.
    pub key_path: Option<String>,
    /// Algorithm for newly generated keys: `"ed25519"` or `"rsa"`.
    pub key_type: String,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self {
            key_path: None,
            key_type: "ed25519".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["datum_token=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
