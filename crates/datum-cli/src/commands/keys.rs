//! Keys command - manage the node's signing key.

use anyhow::{Result, bail};
use datum_config::ResolvedConfig;
use datum_crypto::{KeyPair, KeyType};

use crate::config_bridge;
use crate::theme::Theme;

/// Load the node key. Fails if none has been generated yet.
pub(crate) fn load_node_key(resolved: &ResolvedConfig) -> Result<KeyPair> {
    let key_path = config_bridge::key_path(resolved);
    if !key_path.exists() {
        bail!(
            "no key at {}; run `datum keys generate` first",
            key_path.display()
        );
    }
    Ok(KeyPair::load_or_generate(&key_path, config_bridge::key_type(&resolved.config)?)?)
}

/// Show the current key.
pub(crate) fn show_key(resolved: &ResolvedConfig) -> Result<()> {
    let key = load_node_key(resolved)?;
    print_key(&key, resolved);
    Ok(())
}

/// Generate a new key. An existing key is only replaced with `force`.
pub(crate) fn generate_key(
    resolved: &ResolvedConfig,
    key_type: Option<KeyType>,
    force: bool,
) -> Result<()> {
    let key_path = config_bridge::key_path(resolved);
    let key_type = match key_type {
        Some(t) => t,
        None => config_bridge::key_type(&resolved.config)?,
    };

    if key_path.exists() {
        if !force {
            println!(
                "{}",
                Theme::warning("A key already exists. Tokens it issued become unverifiable if replaced.")
            );
            bail!("refusing to replace {} without --force", key_path.display());
        }
        std::fs::remove_file(&key_path)?;
    }

    let key = KeyPair::load_or_generate(&key_path, key_type)?;
    println!("{}", Theme::success("New key generated."));
    print_key(&key, resolved);
    Ok(())
}

fn print_key(key: &KeyPair, resolved: &ResolvedConfig) {
    println!("\n{}", Theme::header("Node Key"));
    println!("{}", Theme::field("Key ID", key.key_id()));
    println!("{}", Theme::field("Type", key.key_type()));
    println!("{}", Theme::field("Public key", key.public_key().to_base64()));
    println!(
        "{}",
        Theme::field("Key file", config_bridge::key_path(resolved).display())
    );
    println!();
}
