//! Canonical key identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::ContentHash;

/// Length of a key id in hex characters.
const KEY_ID_HEX_LEN: usize = 64;

/// Canonical identifier of a public key.
///
/// Derived as the lowercase hex BLAKE3 hash of the key's type tag followed
/// by its public key bytes, so two keys of different families can never
/// collide. Tokens carry this value in their `iss` claim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    pub(crate) fn derive(type_tag: u8, public_bytes: &[u8]) -> Self {
        Self(ContentHash::hash_multi(&[&[type_tag], public_bytes]).to_hex())
    }

    /// Parse and validate a key id string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyId`] unless the string is exactly
    /// 64 lowercase hex characters.
    pub fn parse(s: &str) -> CryptoResult<Self> {
        let well_formed = s.len() == KEY_ID_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(CryptoError::InvalidKeyId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..16]
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KeyId {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyId {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_type_separated() {
        let bytes = [7u8; 32];
        assert_ne!(KeyId::derive(1, &bytes), KeyId::derive(2, &bytes));
        assert_eq!(KeyId::derive(1, &bytes), KeyId::derive(1, &bytes));
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = KeyId::derive(1, b"public");
        let parsed: KeyId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(KeyId::parse("").is_err());
        assert!(KeyId::parse("abc").is_err());
        assert!(KeyId::parse(&"G".repeat(64)).is_err());
        assert!(KeyId::parse(&"A".repeat(64)).is_err());
        assert!(KeyId::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = KeyId::derive(2, b"rsa");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: KeyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<KeyId>("\"nope\"").is_err());
    }
}
