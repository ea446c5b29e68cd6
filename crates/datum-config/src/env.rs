//! Environment variable fallbacks.
//!
//! `DATUM_*` variables fill in fields that no config file set. A value
//! written in a file always wins over the environment.

use std::collections::{HashMap, HashSet};

use crate::merge::set_path;

/// Prefix of every variable this crate reads.
pub const ENV_PREFIX: &str = "DATUM_";

/// Variable naming the datum home directory.
pub const HOME_VAR: &str = "DATUM_HOME";

/// Environment variables and the config field each one falls back into.
pub const ENV_FALLBACKS: &[(&str, &str)] = &[
    ("DATUM_POLICY_PATH", "access.policy_path"),
    ("DATUM_TOKEN_STORE", "tokens.store_path"),
    ("DATUM_KEY_PATH", "keys.key_path"),
    ("DATUM_KEY_TYPE", "keys.key_type"),
    ("DATUM_LOG_LEVEL", "logging.level"),
    ("DATUM_LOG_FORMAT", "logging.format"),
];

/// Snapshot the `DATUM_*` variables of this process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply fallbacks for fields not in `set_by_files`. Returns how many were
/// applied.
pub(crate) fn apply_env_fallbacks(
    merged: &mut toml::Value,
    set_by_files: &HashSet<String>,
    env: &HashMap<String, String>,
) -> usize {
    let mut applied: usize = 0;
    for (var, field) in ENV_FALLBACKS {
        if set_by_files.contains(*field) {
            continue;
        }
        if let Some(value) = env.get(*var).filter(|v| !v.is_empty()) {
            set_path(merged, field, value);
            tracing::debug!(var, field, "applied environment fallback");
            applied = applied.saturating_add(1);
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_skips_file_set_fields() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let set: HashSet<String> = ["logging.level".to_owned()].into_iter().collect();
        let env: HashMap<String, String> = [
            ("DATUM_LOG_LEVEL".to_owned(), "trace".to_owned()),
            ("DATUM_KEY_PATH".to_owned(), "/keys/node.key".to_owned()),
        ]
        .into_iter()
        .collect();

        assert_eq!(apply_env_fallbacks(&mut merged, &set, &env), 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
        assert_eq!(merged["keys"]["key_path"].as_str(), Some("/keys/node.key"));
    }

    #[test]
    fn test_empty_values_ignored() {
        let mut merged: toml::Value = toml::from_str("").unwrap();
        let env: HashMap<String, String> =
            [("DATUM_POLICY_PATH".to_owned(), String::new())].into_iter().collect();
        assert_eq!(apply_env_fallbacks(&mut merged, &HashSet::new(), &env), 0);
    }
}
