//! BLAKE3 content hashing.
//!
//! A [`ContentHash`] is both the primary lookup key for a block (the hash of
//! its payload) and the link between neighbouring blocks (the digest of the
//! predecessor's signature).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a content hash in bytes.
pub const HASH_LEN: usize = 32;

/// A 32-byte BLAKE3 digest.
///
/// The all-zero value is reserved as the genesis sentinel: the "previous"
/// reference of the first block in a chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Hash arbitrary data.
    #[must_use]
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash under a derivation context, so equal bytes hashed for different
    /// purposes never collide.
    ///
    /// ```
    /// use heath_crypto::ContentHash;
    ///
    /// let a = ContentHash::hash_with_domain("heath-signature-v1", b"x");
    /// assert_ne!(a, ContentHash::hash(b"x"));
    /// ```
    #[must_use]
    pub fn hash_with_domain(domain: &str, data: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(domain);
        hasher.update(data);
        Self(*hasher.finalize().as_bytes())
    }

    /// The genesis sentinel.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; HASH_LEN])
    }

    /// Whether this is the genesis sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Wrap raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice; `None` unless it is exactly 32 bytes.
    #[must_use]
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; HASH_LEN]>::try_from(slice).ok().map(Self)
    }

    /// Lowercase hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not 32 bytes long.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        Self::try_from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }

    /// First eight hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Default for ContentHash {
    fn default() -> Self {
        Self::zero()
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for ContentHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl std::str::FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = ContentHash::hash(b"payload");
        assert_eq!(a, ContentHash::hash(b"payload"));
        assert_ne!(a, ContentHash::hash(b"payload!"));
    }

    #[test]
    fn test_empty_payload_is_not_genesis() {
        assert!(!ContentHash::hash(b"").is_zero());
        assert!(ContentHash::zero().is_zero());
        assert_eq!(ContentHash::default(), ContentHash::zero());
    }

    #[test]
    fn test_domains_separate() {
        let data = b"same";
        assert_ne!(
            ContentHash::hash_with_domain("one", data),
            ContentHash::hash_with_domain("two", data)
        );
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(ContentHash::from_hex("abcd").is_err());
        assert!(ContentHash::from_hex("zz").is_err());

        let hash = ContentHash::hash(b"x");
        let parsed: ContentHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn test_serde_uses_hex() {
        let hash = ContentHash::hash(b"x");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
    }

    #[test]
    fn test_short_prefix() {
        let hash = ContentHash::hash(b"x");
        assert_eq!(hash.short().len(), 8);
        assert!(hash.to_hex().starts_with(&hash.short()));
    }
}
