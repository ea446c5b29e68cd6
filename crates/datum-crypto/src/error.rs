//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur while handling key material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// The key algorithm is not one of the supported families.
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Invalid public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid private key.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// A string is not a well-formed key identifier.
    #[error("invalid key id: {0}")]
    InvalidKeyId(String),

    /// No public key is stored under the given identifier.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Encoding key material failed.
    #[error("key encoding failed: {0}")]
    Encoding(String),

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,

    /// Key store internal failure (poisoned lock).
    #[error("key store error: {0}")]
    KeyStore(String),

    /// I/O error (e.g. reading/writing key files).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
