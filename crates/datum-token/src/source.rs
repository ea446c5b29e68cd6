//! Issuing and checking tokens with one local key pair.

use std::fmt;
use std::time::Duration;

use datum_core::Profile;
use datum_crypto::{KeyId, KeyPair};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};

use crate::claims::{Claims, NumericDate, Token};
use crate::clock::SharedClock;
use crate::error::{TokenError, TokenResult};
use crate::jws::{self, Family};

/// Signs tokens with a private key and verifies tokens signed by it.
///
/// The signature algorithm is fixed when the source is built: `EdDSA` for
/// Ed25519 keys, `RS256` for RSA keys.
pub struct TokenSource {
    key_id: KeyId,
    family: Family,
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: SharedClock,
}

impl TokenSource {
    /// Build a source for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key cannot be encoded for signing.
    pub fn new(key: &KeyPair, clock: SharedClock) -> TokenResult<Self> {
        let family = Family::of(key.key_type());
        let encoding = jws::encoding_key(key)?;
        let decoding = jws::decoding_key(&key.public_key());
        Ok(Self {
            key_id: key.key_id(),
            family,
            encoding,
            decoding,
            clock,
        })
    }

    /// Id of the signing key; written as the issuer of every token.
    #[must_use]
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// Algorithm used for signing.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.family.signing_algorithm()
    }

    /// Issue a user token for `profile`. A zero `ttl` issues a token that
    /// never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if `ttl` is out of range or signing fails.
    pub fn create_token(&self, profile: &Profile, ttl: Duration) -> TokenResult<String> {
        self.create_token_with_claims(Claims::for_profile(profile), ttl)
    }

    /// Issue a token carrying `claims`.
    ///
    /// The issuer is always replaced with this source's key id and the
    /// expiry is derived from `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if `ttl` is out of range or signing fails.
    pub fn create_token_with_claims(&self, mut claims: Claims, ttl: Duration) -> TokenResult<String> {
        claims.iss = self.key_id.to_string();
        claims.exp = self.expiry(ttl)?;

        let header = Header::new(self.algorithm());
        let raw = jsonwebtoken::encode(&header, &claims, &self.encoding)?;
        tracing::debug!(
            issuer = %self.key_id.short(),
            subject = %claims.sub,
            client_type = %claims.client_type,
            exp = ?claims.exp,
            "issued token"
        );
        Ok(raw)
    }

    fn expiry(&self, ttl: Duration) -> TokenResult<Option<NumericDate>> {
        if ttl.is_zero() {
            return Ok(None);
        }
        let delta = chrono::Duration::from_std(ttl)
            .map_err(|_| TokenError::InvalidRequest(format!("ttl {ttl:?} out of range")))?;
        let exp = self
            .clock
            .now()
            .checked_add_signed(delta)
            .ok_or_else(|| TokenError::InvalidRequest(format!("ttl {ttl:?} out of range")))?;
        Ok(Some(NumericDate::from_datetime(exp)))
    }

    /// The key that verifies a token with this header.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::UnexpectedSigningMethod`] if the header names an
    /// algorithm outside this source's family.
    pub fn verification_key(&self, header: &Header) -> TokenResult<&DecodingKey> {
        self.family.check(header)?;
        Ok(&self.decoding)
    }

    /// Verify a token signed by this source's key and check its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] for malformed input,
    /// [`TokenError::UnexpectedSigningMethod`], [`TokenError::InvalidSignature`]
    /// or [`TokenError::Expired`].
    pub fn parse(&self, raw: &str) -> TokenResult<Token> {
        let token = jws::verify(raw, self.family, &self.decoding)?;
        if token.is_expired(self.clock.as_ref()) {
            return Err(TokenError::Expired);
        }
        Ok(token)
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
