//! Ed25519 key pairs, public keys and the [`Signer`] seam.

use std::io::Write;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signer as DalekSigner, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::signature::SignatureBytes;

/// Length of an Ed25519 public or secret key.
pub const KEY_LEN: usize = 32;

/// Something that can sign block encodings.
///
/// Block construction only depends on this trait, so signing can live behind
/// an HSM, an agent socket, or an in-process [`KeyPair`].
pub trait Signer {
    /// The public key whose secret counterpart produces signatures.
    fn public_key(&self) -> PublicKey;

    /// Sign `message`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SigningFailed`] if the key material cannot
    /// produce a signature.
    fn try_sign(&self, message: &[u8]) -> CryptoResult<SignatureBytes>;
}

/// An Ed25519 key pair.
///
/// The secret key is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    verifying_key: VerifyingKey,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh random key pair.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            verifying_key,
            signing_key,
        }
    }

    /// Rebuild from a 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `bytes` is not 32 bytes.
    pub fn from_secret_key(bytes: &[u8]) -> CryptoResult<Self> {
        let mut secret: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;

        let signing_key = SigningKey::from_bytes(&secret);
        secret.zeroize();

        Ok(Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
        })
    }

    /// Public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8; KEY_LEN] {
        self.verifying_key.as_bytes()
    }

    /// Public half, safe to share.
    #[must_use]
    pub fn export_public_key(&self) -> PublicKey {
        PublicKey::from_bytes(*self.public_key_bytes())
    }

    /// Short key identifier for log lines.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        self.export_public_key().key_id_hex()
    }

    /// Secret key bytes. Only for writing key files.
    #[must_use]
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Load the key stored at `path`, or generate one and store it there.
    ///
    /// New key files are created with `O_CREAT | O_EXCL` and mode 0o600 on
    /// Unix. Symlinks are refused on the read path. Parent directories are
    /// created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] on I/O failure or when `path` is a
    /// symlink, and [`CryptoError::InvalidKeyLength`] if the file is not a
    /// 32-byte secret key.
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CryptoError::IoError(e.to_string()))?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        match options.open(path) {
            Ok(mut file) => {
                let kp = Self::generate();
                file.write_all(kp.secret_key_bytes().as_slice())
                    .map_err(|e| CryptoError::IoError(e.to_string()))?;
                return Ok(kp);
            },
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {},
            Err(e) => return Err(CryptoError::IoError(e.to_string())),
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
        Self::from_secret_key(&bytes)
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> PublicKey {
        self.export_public_key()
    }

    fn try_sign(&self, message: &[u8]) -> CryptoResult<SignatureBytes> {
        self.signing_key
            .try_sign(message)
            .map(SignatureBytes::from)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// An Ed25519 public key, serialized as base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    /// Wrap raw bytes. The bytes are not checked to be a valid point until
    /// [`verify`](Self::verify).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless the slice is 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        <[u8; KEY_LEN]>::try_from(slice)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: slice.len(),
            })
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// First eight bytes, used as a short identifier.
    #[must_use]
    pub fn key_id(&self) -> [u8; 8] {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[..8]);
        id
    }

    /// Short identifier as hex.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.key_id())
    }

    /// Full key as hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Full key as base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Decode from base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base64 or not 32 bytes.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| CryptoError::InvalidBase64Encoding)?;
        Self::try_from_slice(&bytes)
    }

    /// Verify `signature` over `message`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes are not a curve
    /// point, or [`CryptoError::SignatureVerificationFailed`].
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> CryptoResult<()> {
        let verifying_key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        verifying_key
            .verify(message, &signature.to_dalek())
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.key_id_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
