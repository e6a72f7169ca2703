//! A set of public keys a verifier is willing to accept.
//!
//! A chain may be signed by several keys over its lifetime (rotation, hand
//! over between operators). [`TrustedKeys`] lets a verifier pin the keys it
//! accepts without caring which one signed a given block.

use std::collections::HashMap;

use crate::keypair::PublicKey;

/// Key identifier (first 8 bytes of the public key).
pub type KeyId = [u8; 8];

/// Trusted public keys indexed by [`KeyId`].
///
/// ```
/// use heath_crypto::{KeyPair, Signer, TrustedKeys};
///
/// let keypair = KeyPair::generate();
/// let mut trusted = TrustedKeys::new();
/// trusted.insert(keypair.public_key());
///
/// assert!(trusted.contains(&keypair.public_key()));
/// assert!(!trusted.contains(&KeyPair::generate().public_key()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrustedKeys {
    keys: HashMap<KeyId, PublicKey>,
}

impl TrustedKeys {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `key`, returning its identifier.
    pub fn insert(&mut self, key: PublicKey) -> KeyId {
        let id = key.key_id();
        self.keys.insert(id, key);
        id
    }

    /// Whether exactly this key is trusted.
    ///
    /// Matching is on the full key, not only the short identifier.
    #[must_use]
    pub fn contains(&self, key: &PublicKey) -> bool {
        self.keys.get(&key.key_id()) == Some(key)
    }

    /// Number of trusted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<PublicKey> for TrustedKeys {
    fn from_iter<I: IntoIterator<Item = PublicKey>>(iter: I) -> Self {
        let mut trusted = Self::new();
        for key in iter {
            trusted.insert(key);
        }
        trusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, Signer};

    #[test]
    fn test_insert_and_contains() {
        let pk = KeyPair::generate().public_key();
        let mut trusted = TrustedKeys::new();
        assert!(trusted.is_empty());

        let id = trusted.insert(pk);
        assert_eq!(id, pk.key_id());
        assert!(trusted.contains(&pk));
        assert_eq!(trusted.len(), 1);

        // Re-inserting the same key does not grow the set.
        trusted.insert(pk);
        assert_eq!(trusted.len(), 1);
    }

    #[test]
    fn test_collect_from_keys() {
        let keys: Vec<PublicKey> = (0..3).map(|_| KeyPair::generate().public_key()).collect();
        let trusted: TrustedKeys = keys.iter().copied().collect();

        assert_eq!(trusted.len(), 3);
        assert!(keys.iter().all(|k| trusted.contains(k)));
        assert!(!trusted.contains(&KeyPair::generate().public_key()));
    }

    #[test]
    fn test_key_id_collision_does_not_grant_trust() {
        let real = KeyPair::generate().public_key();
        let mut forged = *real.as_bytes();
        forged[31] ^= 0xff;
        let forged = PublicKey::from_bytes(forged);

        let trusted: TrustedKeys = [real].into_iter().collect();
        assert_eq!(real.key_id(), forged.key_id());
        assert!(!trusted.contains(&forged));
    }
}
