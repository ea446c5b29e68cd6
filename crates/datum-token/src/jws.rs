//! Glue between datum key material and `jsonwebtoken`.

use std::fmt;

use datum_crypto::{KeyPair, KeyType, PublicKey};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{Claims, Token};
use crate::error::{TokenError, TokenResult};

const ED25519_FAMILY: &[Algorithm] = &[Algorithm::EdDSA];
const RSA_FAMILY: &[Algorithm] = &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// A signature algorithm family, fixed by the key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Family(KeyType);

impl Family {
    pub(crate) fn of(key_type: KeyType) -> Self {
        Self(key_type)
    }

    /// Algorithm used when signing with a key of this family.
    pub(crate) fn signing_algorithm(self) -> Algorithm {
        match self.0 {
            KeyType::Ed25519 => Algorithm::EdDSA,
            KeyType::Rsa => Algorithm::RS256,
        }
    }

    fn members(self) -> &'static [Algorithm] {
        match self.0 {
            KeyType::Ed25519 => ED25519_FAMILY,
            KeyType::Rsa => RSA_FAMILY,
        }
    }

    /// Reject a header whose algorithm is outside this family.
    pub(crate) fn check(self, header: &Header) -> TokenResult<()> {
        if self.members().contains(&header.alg) {
            Ok(())
        } else {
            Err(TokenError::UnexpectedSigningMethod(format!(
                "{:?} with {} key",
                header.alg, self
            )))
        }
    }

    fn validation(self) -> Validation {
        let mut validation = Validation::new(self.signing_algorithm());
        validation.algorithms = self.members().to_vec();
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["iss", "sub"]);
        validation
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn encoding_key(key: &KeyPair) -> TokenResult<EncodingKey> {
    match key {
        KeyPair::Ed25519(k) => Ok(EncodingKey::from_ed_der(&k.to_pkcs8_der())),
        KeyPair::Rsa(k) => Ok(EncodingKey::from_rsa_der(&k.to_pkcs1_der()?)),
    }
}

pub(crate) fn decoding_key(key: &PublicKey) -> DecodingKey {
    match key {
        PublicKey::Ed25519(bytes) => DecodingKey::from_ed_der(bytes),
        PublicKey::Rsa(der) => DecodingKey::from_rsa_der(der),
    }
}

/// Check the algorithm family, verify the signature and decode the claims.
///
/// Expiry is not checked here.
pub(crate) fn verify(raw: &str, family: Family, key: &DecodingKey) -> TokenResult<Token> {
    let header = jsonwebtoken::decode_header(raw)?;
    family.check(&header)?;
    let data = jsonwebtoken::decode::<Claims>(raw, key, &family.validation())?;
    Ok(Token::new(raw, data.header, data.claims))
}
