//! CLI handlers for the `datum config` subcommand.

use anyhow::Result;
use datum_config::ResolvedConfig;

/// Show the resolved configuration as TOML.
pub(crate) fn show_config(resolved: &ResolvedConfig) -> Result<()> {
    let output = resolved
        .config
        .to_toml()
        .map_err(|e| anyhow::anyhow!("failed to format config: {e}"))?;
    println!("{output}");
    Ok(())
}

/// Show where configuration and state live.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn show_paths(resolved: &ResolvedConfig) -> Result<()> {
    println!("Home:        {}", resolved.home_dir.display());
    if resolved.loaded_files.is_empty() {
        println!("Config:      (defaults only)");
    } else {
        println!("Config files (in merge order):");
        for path in &resolved.loaded_files {
            println!("  - {path}");
        }
    }
    println!(
        "Key file:    {}",
        crate::config_bridge::key_path(resolved).display()
    );
    println!(
        "Token store: {}",
        resolved
            .resolve_path(&resolved.config.tokens.store_path)
            .display()
    );
    Ok(())
}
