//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Key types accepted in `keys.key_type`.
pub const KEY_TYPES: &[&str] = &["ed25519", "rsa"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_access(config)?;
    validate_tokens(config)?;
    validate_keys(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_access(config: &Config) -> ConfigResult<()> {
    if config
        .access
        .policy_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(invalid("access.policy_path", "must not be empty when set"));
    }
    Ok(())
}

fn validate_tokens(config: &Config) -> ConfigResult<()> {
    let t = &config.tokens;

    if t.access_ttl_secs == 0 {
        return Err(invalid("tokens.access_ttl_secs", "must be greater than 0"));
    }
    if t.refresh_ttl_secs < t.access_ttl_secs {
        return Err(invalid(
            "tokens.refresh_ttl_secs",
            format!(
                "refresh lifetime {}s is shorter than the access lifetime {}s",
                t.refresh_ttl_secs, t.access_ttl_secs
            ),
        ));
    }
    if t.store_path.trim().is_empty() {
        return Err(invalid("tokens.store_path", "must not be empty"));
    }
    Ok(())
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    let key_type = config.keys.key_type.to_ascii_lowercase();
    if !KEY_TYPES.contains(&key_type.as_str()) {
        return Err(invalid(
            "keys.key_type",
            format!(
                "unsupported key type '{}'; expected one of: {}",
                config.keys.key_type,
                KEY_TYPES.join(", ")
            ),
        ));
    }
    if config
        .keys
        .key_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(invalid("keys.key_path", "must not be empty when set"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}
