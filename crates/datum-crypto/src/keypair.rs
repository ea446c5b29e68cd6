//! Key pairs over the supported signature families.
//!
//! A [`KeyPair`] is either Ed25519 or RSA. The family is fixed when the key
//! is constructed; everything downstream (token signing method, verification
//! algorithm) is derived from it by matching on the variant.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::key_id::KeyId;

/// Smallest RSA modulus accepted for signing keys.
pub const MIN_RSA_BITS: usize = 2048;

/// Default RSA modulus size for generated keys.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Supported key families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Ed25519 (signs tokens with `EdDSA`).
    Ed25519,
    /// RSA (signs tokens with `RS256`).
    Rsa,
}

impl KeyType {
    /// One-byte tag used in key files and key id derivation.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Ed25519 => 0x01,
            Self::Rsa => 0x02,
        }
    }

    /// Resolve a tag byte back to a key type.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedKeyType`] for unknown tags.
    pub fn from_tag(tag: u8) -> CryptoResult<Self> {
        match tag {
            0x01 => Ok(Self::Ed25519),
            0x02 => Ok(Self::Rsa),
            other => Err(CryptoError::UnsupportedKeyType(format!("tag {other:#04x}"))),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Rsa => "rsa",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Self::Ed25519),
            "rsa" => Ok(Self::Rsa),
            _ => Err(CryptoError::UnsupportedKeyType(s.to_string())),
        }
    }
}

/// An Ed25519 key pair. The secret key is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct Ed25519KeyPair {
    #[zeroize(skip)]
    verifying_key: VerifyingKey,
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            verifying_key,
            signing_key,
        }
    }

    fn from_secret_key(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }

        let mut secret = [0u8; 32];
        secret.copy_from_slice(bytes);
        let signing_key = SigningKey::from_bytes(&secret);
        let verifying_key = signing_key.verifying_key();
        secret.zeroize();

        Ok(Self {
            verifying_key,
            signing_key,
        })
    }

    /// Raw 32-byte public key.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    /// Raw 32-byte secret key.
    #[must_use]
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Secret key wrapped in a minimal PKCS#8 v1 DER document.
    #[must_use]
    pub fn to_pkcs8_der(&self) -> Zeroizing<Vec<u8>> {
        let mut der = Zeroizing::new(vec![
            0x30, 0x2e, // SEQUENCE, 46 bytes
            0x02, 0x01, 0x00, // INTEGER version 0
            0x30, 0x05, // SEQUENCE, algorithm identifier
            0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
            0x04, 0x22, // OCTET STRING, 34 bytes
            0x04, 0x20, // OCTET STRING, 32 bytes
        ]);
        der.extend_from_slice(&*self.secret_key_bytes());
        der
    }
}

/// An RSA key pair with its PKCS#1 public encoding cached.
pub struct RsaKeyPair {
    private_key: RsaPrivateKey,
    public_der: Vec<u8>,
}

impl RsaKeyPair {
    fn generate(bits: usize) -> CryptoResult<Self> {
        if bits < MIN_RSA_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "RSA keys must be at least {MIN_RSA_BITS} bits, got {bits}"
            )));
        }
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    fn from_pkcs1_der(bytes: &[u8]) -> CryptoResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs1_der(bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> CryptoResult<Self> {
        let bits = private_key.size().saturating_mul(8);
        if bits < MIN_RSA_BITS {
            return Err(CryptoError::InvalidPrivateKey(format!(
                "RSA key of {bits} bits is below the {MIN_RSA_BITS} bit minimum"
            )));
        }
        let public_der = RsaPublicKey::from(&private_key)
            .to_pkcs1_der()
            .map_err(|e| CryptoError::Encoding(e.to_string()))?
            .as_bytes()
            .to_vec();
        Ok(Self {
            private_key,
            public_der,
        })
    }

    /// PKCS#1 DER encoding of the public key.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// PKCS#1 DER encoding of the private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encoding`] if the key cannot be serialized.
    pub fn to_pkcs1_der(&self) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let doc = self
            .private_key
            .to_pkcs1_der()
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }
}

/// A private key able to sign tokens.
pub enum KeyPair {
    /// Ed25519 key pair.
    Ed25519(Ed25519KeyPair),
    /// RSA key pair.
    Rsa(RsaKeyPair),
}

impl KeyPair {
    /// Generate a new key of the given family.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if RSA generation fails.
    pub fn generate(key_type: KeyType) -> CryptoResult<Self> {
        match key_type {
            KeyType::Ed25519 => Ok(Self::generate_ed25519()),
            KeyType::Rsa => Self::generate_rsa(DEFAULT_RSA_BITS),
        }
    }

    /// Generate a new Ed25519 key.
    #[must_use]
    pub fn generate_ed25519() -> Self {
        Self::Ed25519(Ed25519KeyPair::generate())
    }

    /// Generate a new RSA key with the given modulus size.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if `bits` is below
    /// [`MIN_RSA_BITS`] or generation fails.
    pub fn generate_rsa(bits: usize) -> CryptoResult<Self> {
        RsaKeyPair::generate(bits).map(Self::Rsa)
    }

    /// Reconstruct a key from its encoded form.
    ///
    /// Ed25519 keys are the raw 32-byte secret; RSA keys are PKCS#1 DER.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not decode as a key of that type.
    pub fn from_encoded(key_type: KeyType, bytes: &[u8]) -> CryptoResult<Self> {
        match key_type {
            KeyType::Ed25519 => Ed25519KeyPair::from_secret_key(bytes).map(Self::Ed25519),
            KeyType::Rsa => RsaKeyPair::from_pkcs1_der(bytes).map(Self::Rsa),
        }
    }

    /// Encode the private key (see [`from_encoded`](Self::from_encoded)).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encoding`] if an RSA key cannot be serialized.
    pub fn encode(&self) -> CryptoResult<Zeroizing<Vec<u8>>> {
        match self {
            Self::Ed25519(k) => Ok(Zeroizing::new(k.secret_key_bytes().to_vec())),
            Self::Rsa(k) => k.to_pkcs1_der(),
        }
    }

    /// Key family.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::Rsa(_) => KeyType::Rsa,
        }
    }

    /// Public half of the key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Ed25519(k) => PublicKey::Ed25519(*k.public_key_bytes()),
            Self::Rsa(k) => PublicKey::Rsa(k.public_der.clone()),
        }
    }

    /// Canonical identifier of this key.
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        self.public_key().key_id()
    }

    /// Load an existing key from a file, or generate and save a new one.
    ///
    /// The file holds a one-byte [`KeyType::tag`] followed by the encoded
    /// key. An existing file keeps its own type regardless of `key_type`.
    ///
    /// On Unix the file is created atomically with mode 0o600, and key files
    /// that are symlinks are refused.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] on I/O failures or symlink detection,
    /// or a decoding error if the file content is not a valid key.
    pub fn load_or_generate(path: impl AsRef<Path>, key_type: KeyType) -> CryptoResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::IoError(e.to_string()))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(path)
            {
                Ok(mut file) => {
                    let kp = Self::generate(key_type)?;
                    file.write_all(&kp.to_file_bytes()?)
                        .map_err(|e| CryptoError::IoError(e.to_string()))?;
                    tracing::info!(key_id = %kp.key_id().short(), %key_type, "generated key");
                    return Ok(kp);
                },
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {},
                Err(e) => return Err(CryptoError::IoError(e.to_string())),
            }
        }

        #[cfg(not(unix))]
        if !path.exists() {
            let kp = Self::generate(key_type)?;
            let mut file =
                std::fs::File::create(path).map_err(|e| CryptoError::IoError(e.to_string()))?;
            file.write_all(&kp.to_file_bytes()?)
                .map_err(|e| CryptoError::IoError(e.to_string()))?;
            return Ok(kp);
        }

        let meta =
            std::fs::symlink_metadata(path).map_err(|e| CryptoError::IoError(e.to_string()))?;
        if meta.file_type().is_symlink() {
            return Err(CryptoError::IoError(
                "refusing to read key file: path is a symlink".into(),
            ));
        }

        let bytes =
            Zeroizing::new(std::fs::read(path).map_err(|e| CryptoError::IoError(e.to_string()))?);
        Self::from_file_bytes(&bytes)
    }

    fn to_file_bytes(&self) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let encoded = self.encode()?;
        let mut out = Zeroizing::new(Vec::with_capacity(encoded.len().saturating_add(1)));
        out.push(self.key_type().tag());
        out.extend_from_slice(&encoded);
        Ok(out)
    }

    fn from_file_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let (tag, rest) = bytes.split_first().ok_or(CryptoError::InvalidKeyLength {
            expected: 33,
            actual: 0,
        })?;
        Self::from_encoded(KeyType::from_tag(*tag)?, rest)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("type", &self.key_type())
            .field("key_id", &self.key_id().short())
            .finish_non_exhaustive()
    }
}

/// A public key (safe to share, serialize, etc.).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EncodedPublicKey", into = "EncodedPublicKey")]
pub enum PublicKey {
    /// Raw 32-byte Ed25519 public key.
    Ed25519([u8; 32]),
    /// PKCS#1 DER encoded RSA public key.
    Rsa(Vec<u8>),
}

impl PublicKey {
    /// Build a public key from its family and encoded bytes, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] or
    /// [`CryptoError::InvalidKeyLength`] if the bytes are not a valid key.
    pub fn from_parts(key_type: KeyType, bytes: &[u8]) -> CryptoResult<Self> {
        match key_type {
            KeyType::Ed25519 => {
                let raw: [u8; 32] =
                    bytes
                        .try_into()
                        .map_err(|_| CryptoError::InvalidKeyLength {
                            expected: 32,
                            actual: bytes.len(),
                        })?;
                VerifyingKey::from_bytes(&raw)
                    .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
                Ok(Self::Ed25519(raw))
            },
            KeyType::Rsa => {
                RsaPublicKey::from_pkcs1_der(bytes)
                    .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
                Ok(Self::Rsa(bytes.to_vec()))
            },
        }
    }

    /// Key family.
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::Rsa(_) => KeyType::Rsa,
        }
    }

    /// Encoded public key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(b) => b,
            Self::Rsa(der) => der,
        }
    }

    /// Canonical identifier of this key.
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        KeyId::derive(self.key_type().tag(), self.as_bytes())
    }

    /// Encode the key bytes as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.as_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}:{})", self.key_type(), self.key_id().short())
    }
}

#[derive(Serialize, Deserialize)]
struct EncodedPublicKey {
    #[serde(rename = "type")]
    key_type: KeyType,
    key: String,
}

impl TryFrom<EncodedPublicKey> for PublicKey {
    type Error = CryptoError;

    fn try_from(value: EncodedPublicKey) -> Result<Self, Self::Error> {
        let bytes = STANDARD
            .decode(&value.key)
            .map_err(|_| CryptoError::InvalidBase64Encoding)?;
        Self::from_parts(value.key_type, &bytes)
    }
}

impl From<PublicKey> for EncodedPublicKey {
    fn from(pk: PublicKey) -> Self {
        Self {
            key_type: pk.key_type(),
            key: pk.to_base64(),
        }
    }
}
