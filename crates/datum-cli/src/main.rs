//! Datum CLI - keys, bearer tokens and access policy.
//!
//! A thin wrapper over the datum libraries: it loads the layered config,
//! sets up logging, and dispatches to one command per subcommand.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datum_config::{Config, ResolvedConfig};
use datum_crypto::KeyType;

mod commands;
mod config_bridge;
mod theme;

use commands::{access, config, keys, token};
use theme::Theme;

/// Datum - access control and identity tokens
#[derive(Parser)]
#[command(name = "datum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a configuration file layered over the user config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Datum home directory (defaults to `~/.datum`)
    #[arg(long, global = true, env = "DATUM_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the node signing key
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Issue, verify and store bearer tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Evaluate the access policy
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the current key
    Show,
    /// Generate a new key
    Generate {
        /// Key family (defaults to `keys.key_type`)
        #[arg(short = 't', long = "type")]
        key_type: Option<KeyType>,
        /// Replace an existing key
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue a token for a profile, signed with the node key
    Issue {
        /// Profile id written as the token subject
        #[arg(long)]
        profile_id: String,
        /// Username claim
        #[arg(long)]
        username: String,
        /// Lifetime in seconds; 0 never expires (defaults to `tokens.access_ttl_secs`)
        #[arg(long)]
        ttl: Option<u64>,
        /// Also print a refresh token on a second line
        #[arg(long)]
        refresh: bool,
        /// Also store the access token under this key
        #[arg(long)]
        store: Option<String>,
    },
    /// Exchange a refresh token for a new access token
    Refresh {
        /// Refresh token issued by `token issue --refresh`
        token: String,
    },
    /// Verify a token against the node key
    Verify {
        /// Compact token string
        token: String,
        /// Only decode; do not check the signature
        #[arg(long)]
        unverified: bool,
    },
    /// List stored tokens
    Ls {
        /// Number of tokens to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Maximum number of tokens; 0 lists all
        #[arg(long, default_value = "0")]
        limit: i64,
    },
    /// Print a stored token
    Get {
        /// Store key
        key: String,
    },
    /// Store a token
    Put {
        /// Store key
        key: String,
        /// Compact token string
        token: String,
    },
    /// Remove a stored token
    Rm {
        /// Store key
        key: String,
    },
}

#[derive(Subcommand)]
enum AccessCommands {
    /// Check whether a profile may perform an action on a resource
    Check {
        /// Profile id of the subject
        #[arg(long)]
        subject_id: String,
        /// Username of the subject
        #[arg(long)]
        username: String,
        /// Resource, e.g. `dataset:QmXyz:flights`
        #[arg(long)]
        resource: String,
        /// Action, e.g. `remote:pull`
        #[arg(long)]
        action: String,
    },
    /// Print the effective policy
    Show,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Show config, key and token store locations
    Paths,
}

fn load_config(cli: &Cli) -> Result<ResolvedConfig> {
    let resolved = match &cli.home {
        Some(home) => Config::load_with_home(cli.config.as_deref(), home),
        None => Config::load(cli.config.as_deref()),
    };
    resolved.context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = load_config(&cli)?;

    let mut log_config = config_bridge::to_log_config(&resolved.config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = datum_telemetry::setup_logging(&log_config) {
        eprintln!("{}", Theme::warning(&format!("Failed to initialize logging: {e}")));
    }
    tracing::debug!(
        home = %resolved.home_dir.display(),
        files = ?resolved.loaded_files,
        "configuration loaded"
    );

    match cli.command {
        Commands::Keys { command } => handle_keys(&resolved, command),
        Commands::Token { command } => handle_token(&resolved, command).await,
        Commands::Access { command } => handle_access(&resolved, command),
        Commands::Config { command } => handle_config(&resolved, &command),
    }
}

fn handle_keys(resolved: &ResolvedConfig, command: KeyCommands) -> Result<()> {
    match command {
        KeyCommands::Show => keys::show_key(resolved),
        KeyCommands::Generate { key_type, force } => keys::generate_key(resolved, key_type, force),
    }
}

async fn handle_token(resolved: &ResolvedConfig, command: TokenCommands) -> Result<()> {
    match command {
        TokenCommands::Issue {
            profile_id,
            username,
            ttl,
            refresh,
            store,
        } => {
            token::issue_token(resolved, &profile_id, &username, ttl, refresh, store.as_deref())
                .await
        },
        TokenCommands::Refresh { token } => token::refresh_token(resolved, &token).await,
        TokenCommands::Verify { token, unverified } => {
            token::verify_token(resolved, &token, unverified)
        },
        TokenCommands::Ls { offset, limit } => token::list_tokens(resolved, offset, limit).await,
        TokenCommands::Get { key } => token::get_token(resolved, &key).await,
        TokenCommands::Put { key, token } => token::put_token(resolved, &key, &token).await,
        TokenCommands::Rm { key } => token::remove_token(resolved, &key).await,
    }
}

fn handle_access(resolved: &ResolvedConfig, command: AccessCommands) -> Result<()> {
    match command {
        AccessCommands::Check {
            subject_id,
            username,
            resource,
            action,
        } => access::check_access(resolved, &subject_id, &username, &resource, &action),
        AccessCommands::Show => access::show_policy(resolved),
    }
}

fn handle_config(resolved: &ResolvedConfig, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => config::show_config(resolved),
        ConfigCommands::Paths => config::show_paths(resolved),
    }
}
