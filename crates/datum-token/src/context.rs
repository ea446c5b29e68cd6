//! Request-scoped identity.
//!
//! An [`AuthContext`] is built once at the edge of a request (usually from
//! the `Authorization` header) and handed to whatever needs to know who is
//! calling, so the wire token is parsed a single time.

use datum_core::ProfileId;
use datum_crypto::KeyStore;

use crate::claims::Token;
use crate::clock::Clock;
use crate::error::{TokenError, TokenResult};
use crate::verify::parse_token;

const BEARER_PREFIX: &str = "bearer ";

/// Identity attached to one request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Option<Token>,
    raw: Option<String>,
}

impl AuthContext {
    /// A context with no identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach a verified token. Also records its raw form.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.raw = Some(token.raw().to_string());
        self.token = Some(token);
        self
    }

    /// Attach a raw token to forward without verifying it here.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Verify a `Bearer <token>` header value and build a context from it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidRequest`] if the value is not a bearer
    /// credential, otherwise any error from [`parse_token`].
    pub fn from_bearer_header(
        value: &str,
        keys: &dyn KeyStore,
        clock: &dyn Clock,
    ) -> TokenResult<Self> {
        let raw = strip_bearer(value)
            .ok_or_else(|| TokenError::InvalidRequest("expected a Bearer credential".into()))?;
        let token = parse_token(raw, keys, clock)?;
        Ok(Self::default().with_token(token))
    }

    /// The verified token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// The raw token string, if any.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Profile id of the caller, if a verified token is attached.
    #[must_use]
    pub fn subject(&self) -> Option<ProfileId> {
        self.token.as_ref().map(Token::subject)
    }

    /// Whether a verified token is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

fn strip_bearer(value: &str) -> Option<&str> {
    let value = value.trim();
    let prefix = value.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let raw = value.get(BEARER_PREFIX.len()..)?.trim_start();
    (!raw.is_empty()).then_some(raw)
}
