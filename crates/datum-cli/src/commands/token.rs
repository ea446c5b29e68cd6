//! Token command - issue, verify and store bearer tokens.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use datum_config::ResolvedConfig;
use datum_core::{MemoryProfileStore, Profile};
use datum_crypto::{KeyPair, MemoryKeyStore};
use datum_token::{
    LocalProvider, SystemClock, Token, TokenProvider, TokenRequest, TokenStore, decode_unverified,
    parse_token,
};
use tokio_util::sync::CancellationToken;

use crate::commands::keys::load_node_key;
use crate::config_bridge;
use crate::theme::Theme;

async fn open_store(resolved: &ResolvedConfig, cancel: &CancellationToken) -> Result<TokenStore> {
    let (fs, name) = config_bridge::token_store_location(resolved)?;
    TokenStore::open(fs, name, cancel)
        .await
        .context("failed to open token store")
}

/// A provider that signs for a single profile with the node key.
fn node_provider(
    resolved: &ResolvedConfig,
    profile_id: &str,
    username: &str,
) -> Result<LocalProvider> {
    let key = Arc::new(load_node_key(resolved)?);
    single_profile_provider(resolved, key, profile_id, username)
}

fn single_profile_provider(
    resolved: &ResolvedConfig,
    key: Arc<KeyPair>,
    profile_id: &str,
    username: &str,
) -> Result<LocalProvider> {
    let keys = Arc::new(MemoryKeyStore::with_keys([key.public_key()]));

    let profiles = MemoryProfileStore::new();
    profiles.add(Profile::new(profile_id, username).with_shared_key(key))?;

    Ok(
        LocalProvider::new(profiles.into_arc(), keys, SystemClock::shared())
            .with_access_ttl(config_bridge::access_ttl(&resolved.config))
            .with_refresh_ttl(config_bridge::refresh_ttl(&resolved.config)),
    )
}

/// Issue tokens for a profile through a password grant signed with the
/// node key.
pub(crate) async fn issue_token(
    resolved: &ResolvedConfig,
    profile_id: &str,
    username: &str,
    ttl_secs: Option<u64>,
    with_refresh: bool,
    store_key: Option<&str>,
) -> Result<()> {
    let mut provider = node_provider(resolved, profile_id, username)?;
    if let Some(ttl) = ttl_secs {
        provider = provider.with_access_ttl(Duration::from_secs(ttl));
    }

    let response = provider
        .token(&TokenRequest::password(username, String::new()))
        .await?;

    if let Some(store_key) = store_key {
        let cancel = CancellationToken::new();
        let store = open_store(resolved, &cancel).await?;
        store
            .put_token(store_key, response.access_token.clone(), &cancel)
            .await?;
        eprintln!("{}", Theme::success(&format!("Stored as '{store_key}'.")));
    }

    println!("{}", response.access_token);
    if let Some(refresh) = response.refresh_token.filter(|_| with_refresh) {
        println!("{refresh}");
    }
    Ok(())
}

/// Exchange a refresh token signed by the node key for a new access token.
pub(crate) async fn refresh_token(resolved: &ResolvedConfig, refresh: &str) -> Result<()> {
    let key = Arc::new(load_node_key(resolved)?);
    let access = refresh_with_key(resolved, key, refresh).await?;
    println!("{access}");
    Ok(())
}

async fn refresh_with_key(
    resolved: &ResolvedConfig,
    key: Arc<KeyPair>,
    refresh: &str,
) -> Result<String> {
    // The profile comes from unverified claims, so the node key is the only
    // trust anchor here: the provider rejects any refresh token it did not sign.
    let (_, claims) = decode_unverified(refresh)?;
    let username = claims.username.unwrap_or_default();
    let provider = single_profile_provider(resolved, key, &claims.sub, &username)?;

    let response = provider.token(&TokenRequest::refresh(refresh)).await?;
    Ok(response.access_token)
}

/// Verify a token against the node key, or just decode it.
pub(crate) fn verify_token(resolved: &ResolvedConfig, raw: &str, unverified: bool) -> Result<()> {
    if unverified {
        let (header, claims) = decode_unverified(raw)?;
        println!("{}", Theme::warning("Signature not checked."));
        println!("{}", Theme::field("Algorithm", format!("{:?}", header.alg)));
        println!("{}", Theme::field("Issuer", &claims.iss));
        println!("{}", Theme::field("Subject", &claims.sub));
        return Ok(());
    }

    let key = load_node_key(resolved)?;
    let keys = MemoryKeyStore::with_keys([key.public_key()]);
    let token = parse_token(raw, &keys, &SystemClock)?;

    println!("{}", Theme::success("Token is valid."));
    print_token(&token);
    Ok(())
}

fn print_token(token: &Token) {
    println!("{}", Theme::field("Algorithm", format!("{:?}", token.algorithm())));
    println!("{}", Theme::field("Issuer", token.issuer()));
    println!("{}", Theme::field("Subject", token.subject()));
    if let Some(username) = token.username() {
        println!("{}", Theme::field("Username", username));
    }
    println!("{}", Theme::field("Client", token.client_type()));
    let expires = token
        .expires_at()
        .map_or_else(|| Theme::dimmed("never"), |at| at.to_rfc3339());
    println!("{}", Theme::field("Expires", expires));
}

/// List stored tokens.
pub(crate) async fn list_tokens(resolved: &ResolvedConfig, offset: usize, limit: i64) -> Result<()> {
    let cancel = CancellationToken::new();
    let store = open_store(resolved, &cancel).await?;
    let tokens = store.list_tokens(offset, limit, &cancel).await?;

    if tokens.is_empty() {
        println!("{}", Theme::info("No stored tokens."));
        return Ok(());
    }

    println!("{}", Theme::header("Stored Tokens"));
    for token in tokens {
        let subject = decode_unverified(&token.raw)
            .map(|(_, claims)| claims.sub)
            .unwrap_or_default();
        println!("  {:<24} {}", token.key, Theme::dimmed(&subject));
    }
    Ok(())
}

/// Print the token stored under `key`.
pub(crate) async fn get_token(resolved: &ResolvedConfig, key: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let store = open_store(resolved, &cancel).await?;
    let raw = store
        .raw_token(key, &cancel)
        .await
        .with_context(|| format!("no token stored under '{key}'"))?;
    println!("{raw}");
    Ok(())
}

/// Store a token under `key`.
pub(crate) async fn put_token(resolved: &ResolvedConfig, key: &str, raw: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let store = open_store(resolved, &cancel).await?;
    store.put_token(key, raw, &cancel).await?;
    println!("{}", Theme::success(&format!("Stored token '{key}'.")));
    Ok(())
}

/// Remove the token stored under `key`.
pub(crate) async fn remove_token(resolved: &ResolvedConfig, key: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let store = open_store(resolved, &cancel).await?;
    store
        .delete_token(key, &cancel)
        .await
        .with_context(|| format!("failed to remove token '{key}'"))?;
    println!("{}", Theme::success(&format!("Removed token '{key}'.")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use datum_config::Config;
    use datum_token::TokenSource;

    fn resolved(home: &std::path::Path) -> ResolvedConfig {
        ResolvedConfig {
            config: Config::default(),
            home_dir: home.to_path_buf(),
            loaded_files: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_refresh_with_node_signed_token() {
        let home = tempfile::tempdir().unwrap();
        let resolved = resolved(home.path());
        let key = Arc::new(KeyPair::generate_ed25519());

        let provider = single_profile_provider(&resolved, key.clone(), "QmAlice", "alice").unwrap();
        let issued = provider
            .token(&TokenRequest::password("alice", String::new()))
            .await
            .unwrap();
        let refresh = issued.refresh_token.unwrap();

        let access = refresh_with_key(&resolved, key, &refresh).await.unwrap();
        let (_, claims) = decode_unverified(&access).unwrap();
        assert_eq!(claims.sub, "QmAlice");
        assert_eq!(claims.username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_refresh_rejects_token_signed_by_other_key() {
        let home = tempfile::tempdir().unwrap();
        let resolved = resolved(home.path());
        let node_key = Arc::new(KeyPair::generate_ed25519());

        // Claims name an arbitrary profile; only the signature can rule it out.
        let stranger = TokenSource::new(&KeyPair::generate_ed25519(), SystemClock::shared()).unwrap();
        let forged = stranger
            .create_token(&Profile::new("QmMallory", "mallory"), Duration::from_secs(60))
            .unwrap();

        assert!(refresh_with_key(&resolved, node_key, &forged).await.is_err());
    }
}
