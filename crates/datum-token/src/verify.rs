//! Verifying tokens issued by any known key.
//!
//! A [`TokenSource`](crate::TokenSource) only checks its own signatures.
//! Tokens from other nodes are checked here: the issuer claim names the
//! signing key, the key store supplies its public half, and the stored key
//! type decides which algorithms are acceptable.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use datum_crypto::{CryptoError, KeyId, KeyStore};
use jsonwebtoken::Header;

use crate::claims::{Claims, Token};
use crate::clock::Clock;
use crate::error::{TokenError, TokenResult};
use crate::jws::{self, Family};

/// Decode a token's header and claims without checking the signature.
///
/// Succeeds only for three dot-separated base64url segments whose header
/// and claims are JSON.
///
/// # Errors
///
/// Returns [`TokenError::InvalidToken`] describing the first problem found.
pub fn decode_unverified(raw: &str) -> TokenResult<(Header, Claims)> {
    let parts: Vec<&str> = raw.split('.').collect();
    let [header, claims, signature] = parts.as_slice() else {
        return Err(TokenError::InvalidToken(format!(
            "expected 3 segments, found {}",
            parts.len()
        )));
    };

    let header: Header = decode_segment(header, "header")?;
    let claims: Claims = decode_segment(claims, "claims")?;
    if signature.is_empty() {
        return Err(TokenError::InvalidToken("empty signature".into()));
    }
    URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| TokenError::InvalidToken(format!("signature: {e}")))?;

    Ok((header, claims))
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> TokenResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::InvalidToken(format!("{what}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::InvalidToken(format!("{what}: {e}")))
}

/// Verify a token against the public key of its issuer.
///
/// # Errors
///
/// - [`TokenError::InvalidToken`] if the token is malformed or its issuer is
///   not a key id
/// - [`TokenError::MissingPublicKey`] if `keys` has no key for the issuer
/// - [`TokenError::UnexpectedSigningMethod`] if the header algorithm does not
///   fit the stored key
/// - [`TokenError::InvalidSignature`] or [`TokenError::Expired`]
pub fn parse_token(raw: &str, keys: &dyn KeyStore, clock: &dyn Clock) -> TokenResult<Token> {
    let (_, claims) = decode_unverified(raw)?;
    let issuer = KeyId::parse(&claims.iss)
        .map_err(|_| TokenError::InvalidToken(format!("issuer {:?} is not a key id", claims.iss)))?;

    let public_key = keys.pub_key(&issuer).map_err(|e| match e {
        CryptoError::KeyNotFound(_) => TokenError::MissingPublicKey(issuer.to_string()),
        other => TokenError::Crypto(other),
    })?;

    let family = Family::of(public_key.key_type());
    let token = jws::verify(raw, family, &jws::decoding_key(&public_key))?;
    if token.is_expired(clock) {
        tracing::debug!(issuer = %issuer.short(), subject = %token.claims().sub, "rejected expired token");
        return Err(TokenError::Expired);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::source::TokenSource;
    use datum_core::Profile;
    use datum_crypto::{KeyPair, MemoryKeyStore};
    use std::sync::OnceLock;
    use std::time::Duration;

    fn rsa_key() -> &'static KeyPair {
        static KEY: OnceLock<KeyPair> = OnceLock::new();
        KEY.get_or_init(|| KeyPair::generate_rsa(2048).unwrap())
    }

    fn alice() -> Profile {
        Profile::new("QmAlice", "alice")
    }

    fn encode(value: &serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn test_decode_unverified_structure() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let source = TokenSource::new(&KeyPair::generate_ed25519(), clock.shared()).unwrap();
        let raw = source.create_token(&alice(), Duration::ZERO).unwrap();

        let (header, claims) = decode_unverified(&raw).unwrap();
        assert_eq!(header.alg, jsonwebtoken::Algorithm::EdDSA);
        assert_eq!(claims.sub, "QmAlice");

        for bad in ["", "a.b", "a.b.c.d", "!!.e30.c2ln", "e30.!!.c2ln"] {
            assert!(
                matches!(decode_unverified(bad), Err(TokenError::InvalidToken(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_unverified_ignores_signature_validity() {
        let header = encode(&serde_json::json!({"alg": "EdDSA", "typ": "JWT"}));
        let claims = encode(&serde_json::json!({"sub": "QmAlice", "iss": "x"}));
        let raw = format!("{header}.{claims}.c2lnbmF0dXJl");
        assert!(decode_unverified(&raw).is_ok());
    }

    #[test]
    fn test_parse_token_with_key_store() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let keys = MemoryKeyStore::new();

        let ed = KeyPair::generate_ed25519();
        keys.add_pub_key(ed.public_key()).unwrap();
        keys.add_pub_key(rsa_key().public_key()).unwrap();

        for key in [&ed, rsa_key()] {
            let source = TokenSource::new(key, clock.shared()).unwrap();
            let raw = source.create_token(&alice(), Duration::from_secs(60)).unwrap();
            let token = parse_token(&raw, &keys, &clock).unwrap();
            assert_eq!(token.subject().as_str(), "QmAlice");
        }
    }

    #[test]
    fn test_parse_token_unknown_issuer() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let keys = MemoryKeyStore::new();
        let source = TokenSource::new(&KeyPair::generate_ed25519(), clock.shared()).unwrap();
        let raw = source.create_token(&alice(), Duration::ZERO).unwrap();

        assert!(matches!(
            parse_token(&raw, &keys, &clock),
            Err(TokenError::MissingPublicKey(_))
        ));
    }

    #[test]
    fn test_parse_token_issuer_not_key_id() {
        let clock = ManualClock::at_unix(0);
        let header = encode(&serde_json::json!({"alg": "EdDSA"}));
        let claims = encode(&serde_json::json!({"sub": "QmAlice", "iss": "not-a-key"}));
        let raw = format!("{header}.{claims}.c2ln");

        assert!(matches!(
            parse_token(&raw, &MemoryKeyStore::new(), &clock),
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_parse_token_rejects_forged_algorithm() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let keys = MemoryKeyStore::new();
        let ed = KeyPair::generate_ed25519();
        keys.add_pub_key(ed.public_key()).unwrap();

        // Claims an HMAC signature keyed by the public key bytes.
        let header = encode(&serde_json::json!({"alg": "HS256", "typ": "JWT"}));
        let claims = encode(&serde_json::json!({"sub": "QmAlice", "iss": ed.key_id().as_str()}));
        let raw = format!("{header}.{claims}.c2lnbmF0dXJl");

        assert!(matches!(
            parse_token(&raw, &keys, &clock),
            Err(TokenError::UnexpectedSigningMethod(_))
        ));
    }

    #[test]
    fn test_parse_token_expiry() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let keys = MemoryKeyStore::new();
        let key = KeyPair::generate_ed25519();
        keys.add_pub_key(key.public_key()).unwrap();

        let source = TokenSource::new(&key, clock.shared()).unwrap();
        let raw = source.create_token(&alice(), Duration::from_secs(10)).unwrap();

        clock.advance(Duration::from_secs(10));
        assert!(parse_token(&raw, &keys, &clock).is_ok());

        clock.advance(Duration::from_secs(1));
        assert!(matches!(
            parse_token(&raw, &keys, &clock),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_parse_token_tampered_claims() {
        let clock = ManualClock::at_unix(1_700_000_000);
        let keys = MemoryKeyStore::new();
        let key = KeyPair::generate_ed25519();
        keys.add_pub_key(key.public_key()).unwrap();

        let source = TokenSource::new(&key, clock.shared()).unwrap();
        let raw = source.create_token(&alice(), Duration::ZERO).unwrap();
        let parts: Vec<&str> = raw.split('.').collect();
        let forged_claims = encode(&serde_json::json!({
            "sub": "QmMallory",
            "iss": key.key_id().as_str(),
            "clientType": "user"
        }));
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert!(matches!(
            parse_token(&forged, &keys, &clock),
            Err(TokenError::InvalidSignature)
        ));
    }
}
