//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `{home}/config.toml` (user)
//! 3. Merge an explicit `--config` file, if given
//! 4. Apply `DATUM_*` env var fallbacks for fields no file set
//! 5. Deserialize merged tree → `Config`
//! 6. Validate
//! 7. Return `ResolvedConfig`

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{HOME_VAR, apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Name of the per-user directory below the home directory.
const DATUM_DIR: &str = ".datum";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Datum home directory; relative paths in the config resolve here.
    pub home_dir: PathBuf,
    /// Config files that contributed, in merge order.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Resolve a configured path against the home directory.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.home_dir.join(p)
        }
    }
}

/// Load configuration with layered file precedence.
///
/// `explicit` is a config file named on the command line; it must exist.
/// `home_override` replaces the datum home directory (normally
/// `$DATUM_HOME` or `~/.datum`).
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, home_override, &collect_env_vars())
}

pub(crate) fn load_with_env(
    explicit: Option<&Path>,
    home_override: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let home_dir = match home_override {
        Some(h) => h.to_path_buf(),
        None => match env.get(HOME_VAR).filter(|h| !h.is_empty()) {
            Some(h) => PathBuf::from(h),
            None => home_directory()?.join(DATUM_DIR),
        },
    };

    // 1. Parse embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut set_by_files = HashSet::new();
    let mut loaded_files = Vec::new();

    // 2. User config.
    let user_path = home_dir.join("config.toml");
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge(&mut merged, &overlay, "", &mut set_by_files);
        loaded_files.push(user_path.display().to_string());
        info!(path = %user_path.display(), "loaded user config");
    }

    // 3. Explicit config.
    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay, "", &mut set_by_files);
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded config");
    }

    // 4. Apply env var fallbacks for unset fields.
    let env_count = apply_env_fallbacks(&mut merged, &set_by_files, env);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 5. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 6. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        home_dir,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or
/// validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    // Check size after reading to avoid TOCTOU between stat and read.
    if u64::try_from(content.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tokens.access_ttl_secs, 7200);
        assert_eq!(config.tokens.refresh_ttl_secs, 2_592_000);
        assert!(config.access.enforce);
    }

    #[test]
    fn test_load_without_files() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, Some(home.path()), &no_env()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(resolved.home_dir, home.path());
    }

    #[test]
    fn test_user_then_explicit_layering() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            "[tokens]\naccess_ttl_secs = 60\nstore_path = \"user.json\"\n",
        )
        .unwrap();
        let explicit = home.path().join("override.toml");
        std::fs::write(&explicit, "[tokens]\nstore_path = \"explicit.json\"\n").unwrap();

        let resolved = load_with_env(Some(&explicit), Some(home.path()), &no_env()).unwrap();
        assert_eq!(resolved.config.tokens.access_ttl_secs, 60);
        assert_eq!(resolved.config.tokens.store_path, "explicit.json");
        assert_eq!(resolved.loaded_files.len(), 2);
    }

    #[test]
    fn test_env_is_fallback_only() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("config.toml"), "[keys]\nkey_type = \"rsa\"\n").unwrap();
        let env: HashMap<String, String> = [
            ("DATUM_KEY_TYPE".to_owned(), "ed25519".to_owned()),
            ("DATUM_POLICY_PATH".to_owned(), "/etc/datum/policy.json".to_owned()),
        ]
        .into_iter()
        .collect();

        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();
        assert_eq!(resolved.config.keys.key_type, "rsa");
        assert_eq!(
            resolved.config.access.policy_path.as_deref(),
            Some("/etc/datum/policy.json")
        );
    }

    #[test]
    fn test_home_from_env() {
        let home = tempfile::tempdir().unwrap();
        let env: HashMap<String, String> =
            [(HOME_VAR.to_owned(), home.path().display().to_string())]
                .into_iter()
                .collect();
        let resolved = load_with_env(None, None, &env).unwrap();
        assert_eq!(resolved.home_dir, home.path());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let home = tempfile::tempdir().unwrap();
        let missing = home.path().join("nope.toml");
        let result = load_with_env(Some(&missing), Some(home.path()), &no_env());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("config.toml"), "[tokens\n").unwrap();
        let result = load_with_env(None, Some(home.path()), &no_env());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("config.toml"), "[keys]\nkey_type = \"dsa\"\n").unwrap();
        let result = load_with_env(None, Some(home.path()), &no_env());
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "keys.key_type"
        ));
    }

    #[test]
    fn test_resolve_path() {
        let resolved = ResolvedConfig {
            config: Config::default(),
            home_dir: PathBuf::from("/home/u/.datum"),
            loaded_files: Vec::new(),
        };
        assert_eq!(
            resolved.resolve_path("tokens.json"),
            PathBuf::from("/home/u/.datum/tokens.json")
        );
        assert_eq!(resolved.resolve_path("/abs/t.json"), PathBuf::from("/abs/t.json"));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
