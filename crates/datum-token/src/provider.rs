//! Credential grants producing access and refresh tokens.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use datum_core::{Profile, ProfileStore};
use datum_crypto::KeyStore;
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::error::{TokenError, TokenResult};
use crate::source::TokenSource;
use crate::verify::parse_token;

/// Default lifetime of an access token.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Default lifetime of a refresh token.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Token type reported in every response.
pub const BEARER: &str = "Bearer";

/// Kind of credential grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantType {
    /// Authorization code exchange.
    #[serde(rename = "authorization_code")]
    AuthorizationCode,
    /// Username and password.
    #[serde(rename = "password")]
    PasswordCredentials,
    /// Client id and secret.
    #[serde(rename = "client_credentials")]
    ClientCredentials,
    /// Exchange of a refresh token for a new access token.
    #[serde(rename = "refresh_token")]
    Refreshing,
    /// Implicit grant.
    #[serde(rename = "implicit")]
    Implicit,
}

/// A grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Requested grant.
    pub grant_type: GrantType,
    /// Authorization code.
    #[serde(default)]
    pub code: String,
    /// Redirect target for code grants.
    #[serde(default)]
    pub redirect_uri: String,
    /// Username for password grants.
    #[serde(default)]
    pub username: String,
    /// Password for password grants.
    #[serde(default)]
    pub password: String,
    /// Refresh token for refresh grants.
    #[serde(default)]
    pub refresh_token: String,
}

impl TokenRequest {
    /// A request with only the grant type set.
    #[must_use]
    pub fn new(grant_type: GrantType) -> Self {
        Self {
            grant_type,
            code: String::new(),
            redirect_uri: String::new(),
            username: String::new(),
            password: String::new(),
            refresh_token: String::new(),
        }
    }

    /// A password grant.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::new(GrantType::PasswordCredentials)
        }
    }

    /// A refresh grant.
    #[must_use]
    pub fn refresh(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            ..Self::new(GrantType::Refreshing)
        }
    }
}

/// Tokens issued for a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token; only issued by password grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Something that turns grant requests into tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Serve a grant request.
    async fn token(&self, request: &TokenRequest) -> TokenResult<TokenResponse>;
}

/// Grants backed by local profiles and a key store.
///
/// Nothing is persisted; callers decide whether to keep the tokens.
pub struct LocalProvider {
    profiles: Arc<dyn ProfileStore>,
    keys: Arc<dyn KeyStore>,
    clock: SharedClock,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl LocalProvider {
    /// Create a provider with the default token lifetimes.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>, keys: Arc<dyn KeyStore>, clock: SharedClock) -> Self {
        Self {
            profiles,
            keys,
            clock,
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }

    /// Set the access token lifetime.
    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    fn source_for(&self, profile: &Profile) -> TokenResult<TokenSource> {
        let key = profile
            .private_key
            .as_ref()
            .ok_or(TokenError::InvalidCredentials)?;
        TokenSource::new(key, self.clock.clone())
    }

    fn response(&self, access_token: String, refresh_token: Option<String>) -> TokenResponse {
        TokenResponse {
            access_token,
            refresh_token,
            token_type: BEARER.to_string(),
            expires_in: self.access_ttl.as_secs(),
        }
    }

    async fn password_grant(&self, request: &TokenRequest) -> TokenResult<TokenResponse> {
        if request.username.is_empty() {
            return Err(TokenError::InvalidRequest("username is required".into()));
        }

        let mut profiles = self
            .profiles
            .profiles_for_username(&request.username)
            .await?;
        if profiles.len() > 1 {
            tracing::warn!(
                username = %request.username,
                count = profiles.len(),
                "multiple profiles share this username, using the first"
            );
        }
        if profiles.is_empty() {
            return Err(TokenError::InvalidCredentials);
        }
        let profile = profiles.swap_remove(0);

        let source = self.source_for(&profile)?;
        let access = source.create_token(&profile, self.access_ttl)?;
        let refresh = source.create_token(&profile, self.refresh_ttl)?;

        tracing::debug!(subject = %profile.id, "password grant issued tokens");
        Ok(self.response(access, Some(refresh)))
    }

    async fn refresh_grant(&self, request: &TokenRequest) -> TokenResult<TokenResponse> {
        if request.refresh_token.is_empty() {
            return Err(TokenError::InvalidRequest("refresh_token is required".into()));
        }

        let refresh = parse_token(&request.refresh_token, self.keys.as_ref(), self.clock.as_ref())?;
        let profile = self.profiles.get_profile(&refresh.subject()).await?;

        let source = self.source_for(&profile)?;
        let access = source.create_token(&profile, self.access_ttl)?;

        tracing::debug!(subject = %profile.id, "refresh grant issued access token");
        Ok(self.response(access, None))
    }
}

#[async_trait]
impl TokenProvider for LocalProvider {
    async fn token(&self, request: &TokenRequest) -> TokenResult<TokenResponse> {
        match request.grant_type {
            GrantType::PasswordCredentials => self.password_grant(request).await,
            GrantType::Refreshing => self.refresh_grant(request).await,
            other => Err(TokenError::InvalidRequest(format!(
                "unsupported grant type {other:?}"
            ))),
        }
    }
}

impl std::fmt::Debug for LocalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
