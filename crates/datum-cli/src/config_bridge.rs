//! Bridge from `datum_config::Config` to domain types.
//!
//! The config crate knows nothing about keys, tokens or policies; every
//! conversion from a config value into one of those lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use datum_access::Policy;
use datum_config::{Config, ResolvedConfig};
use datum_crypto::KeyType;
use datum_storage::LocalFilesystem;
use datum_telemetry::{LogConfig, LogFormat};

/// Key file name used when `keys.key_path` is unset.
pub(crate) const DEFAULT_KEY_FILE: &str = "node.key";

/// Convert the `[logging]` section into a telemetry config.
pub(crate) fn to_log_config(config: &Config) -> LogConfig {
    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    config.logging.directives.iter().fold(
        LogConfig::new(config.logging.level.clone()).with_format(format),
        |lc, d| lc.with_directive(d.clone()),
    )
}

/// Key type for newly generated node keys.
pub(crate) fn key_type(config: &Config) -> Result<KeyType> {
    config
        .keys
        .key_type
        .parse()
        .with_context(|| format!("invalid keys.key_type {:?}", config.keys.key_type))
}

/// Location of the node key file.
pub(crate) fn key_path(resolved: &ResolvedConfig) -> PathBuf {
    resolved.resolve_path(
        resolved
            .config
            .keys
            .key_path
            .as_deref()
            .unwrap_or(DEFAULT_KEY_FILE),
    )
}

/// Access token lifetime.
pub(crate) fn access_ttl(config: &Config) -> Duration {
    Duration::from_secs(config.tokens.access_ttl_secs)
}

/// Refresh token lifetime.
pub(crate) fn refresh_ttl(config: &Config) -> Duration {
    Duration::from_secs(config.tokens.refresh_ttl_secs)
}

/// Filesystem and file name backing the token store.
///
/// The store file's directory becomes the filesystem root so the name
/// handed to the store is always a bare file name.
pub(crate) fn token_store_location(resolved: &ResolvedConfig) -> Result<(Arc<LocalFilesystem>, String)> {
    let full = resolved.resolve_path(&resolved.config.tokens.store_path);
    let name = full
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("tokens.store_path {} has no file name", full.display()))?
        .to_owned();
    let root = full.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((Arc::new(LocalFilesystem::new(root)), name))
}

/// The configured policy, or the built-in default when none is set.
pub(crate) fn load_policy(resolved: &ResolvedConfig) -> Result<Policy> {
    match &resolved.config.access.policy_path {
        Some(path) => {
            let full = resolved.resolve_path(path);
            Policy::from_file(&full)
                .with_context(|| format!("failed to load policy from {}", full.display()))
        },
        None => Ok(Policy::default_policy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(home: &Path, config: Config) -> ResolvedConfig {
        ResolvedConfig {
            config,
            home_dir: home.to_path_buf(),
            loaded_files: Vec::new(),
        }
    }

    #[test]
    fn test_log_config_from_config() {
        let mut config = Config::default();
        config.logging.level = "warn".into();
        config.logging.format = "json".into();
        config.logging.directives = vec!["datum_token=debug".into()];

        let lc = to_log_config(&config);
        assert_eq!(lc.level, "warn");
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.directives, vec!["datum_token=debug"]);
    }

    #[test]
    fn test_key_settings() {
        let home = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        assert_eq!(key_type(&config).unwrap(), KeyType::Ed25519);
        assert_eq!(
            key_path(&resolved(home.path(), config.clone())),
            home.path().join(DEFAULT_KEY_FILE)
        );

        config.keys.key_type = "rsa".into();
        config.keys.key_path = Some("/etc/datum/node.key".into());
        assert_eq!(key_type(&config).unwrap(), KeyType::Rsa);
        assert_eq!(
            key_path(&resolved(home.path(), config)),
            PathBuf::from("/etc/datum/node.key")
        );
    }

    #[test]
    fn test_ttls() {
        let config = Config::default();
        assert_eq!(access_ttl(&config), Duration::from_secs(7200));
        assert_eq!(refresh_ttl(&config), Duration::from_secs(2_592_000));
    }

    #[test]
    fn test_token_store_location() {
        let home = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.tokens.store_path = "state/tokens.json".into();

        let (fs, name) = token_store_location(&resolved(home.path(), config)).unwrap();
        assert_eq!(name, "tokens.json");
        assert_eq!(fs.root(), home.path().join("state"));
    }

    #[test]
    fn test_policy_default_and_file() {
        let home = tempfile::tempdir().unwrap();
        let policy = load_policy(&resolved(home.path(), Config::default())).unwrap();
        assert_eq!(policy, Policy::default_policy());

        std::fs::write(home.path().join("policy.json"), "[]").unwrap();
        let mut config = Config::default();
        config.access.policy_path = Some("policy.json".into());
        let policy = load_policy(&resolved(home.path(), config)).unwrap();
        assert!(policy.is_empty());

        let mut config = Config::default();
        config.access.policy_path = Some("missing.json".into());
        assert!(load_policy(&resolved(home.path(), config)).is_err());
    }
}
