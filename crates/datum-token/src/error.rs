//! Token error types.

use datum_core::ProfileError;
use datum_crypto::CryptoError;
use datum_storage::StorageError;

/// Errors from token issuance, verification, storage and grants.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token is not a structurally valid compact JWS
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// No token is stored under the requested key
    #[error("token not found")]
    TokenNotFound,

    /// The profile a token or request refers to does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The credentials do not identify a profile that can sign
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The request is missing a field or uses an unsupported grant
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The header algorithm does not belong to the verifying key's family
    #[error("unexpected signing method: {0}")]
    UnexpectedSigningMethod(String),

    /// The token's expiry is in the past
    #[error("token is expired")]
    Expired,

    /// The signature does not verify
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The key store holds no public key for the token's issuer
    #[error("no public key for issuer {0}")]
    MissingPublicKey(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Key material could not be used for signing or verification
    #[error("key error: {0}")]
    Key(String),

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Backing storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Profile lookup failed for a reason other than absence
    #[error("profile lookup failed: {0}")]
    Profile(#[source] ProfileError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ProfileError> for TokenError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(id) => Self::NotFound(id),
            other => Self::Profile(other),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm => Self::UnexpectedSigningMethod(err.to_string()),
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::RsaFailedSigning => Self::Key(err.to_string()),
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_jsonwebtoken() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        let sig: TokenError = Error::from(ErrorKind::InvalidSignature).into();
        assert!(matches!(sig, TokenError::InvalidSignature));

        let alg: TokenError = Error::from(ErrorKind::InvalidAlgorithm).into();
        assert!(matches!(alg, TokenError::UnexpectedSigningMethod(_)));

        let structure: TokenError = Error::from(ErrorKind::InvalidToken).into();
        assert!(matches!(structure, TokenError::InvalidToken(_)));
    }

    #[test]
    fn test_profile_not_found_maps_to_not_found() {
        let err: TokenError = ProfileError::NotFound("QmX".into()).into();
        assert!(matches!(err, TokenError::NotFound(ref id) if id == "QmX"));

        let err: TokenError = ProfileError::Internal("poisoned".into()).into();
        assert!(matches!(err, TokenError::Profile(_)));
    }
}
