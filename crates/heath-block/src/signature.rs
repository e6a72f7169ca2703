//! The signature record carried by every block.

use heath_crypto::{ContentHash, PublicKey, SignatureBytes};
use serde::{Deserialize, Serialize};

/// Domain prefix of the canonical signed encoding.
const SIGNING_DOMAIN: &[u8] = b"heath-block-v1";

/// Derivation context for [`Signature::digest`].
const DIGEST_DOMAIN: &str = "heath-signature-v1";

const SIGNING_DATA_LEN: usize = SIGNING_DOMAIN.len() + 32 * 3 + 8;
const DIGEST_INPUT_LEN: usize = 32 * 3 + 64;

/// Content hash, chain link, signer and signature of one block.
///
/// Plain data: a `Signature` says nothing on its own about whether it is
/// valid. [`Block::verify`](crate::Block::verify) checks it against a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    content_hash: ContentHash,
    previous: ContentHash,
    signer: PublicKey,
    signature: SignatureBytes,
}

impl Signature {
    /// Assemble a signature from its parts.
    #[must_use]
    pub const fn new(
        content_hash: ContentHash,
        previous: ContentHash,
        signer: PublicKey,
        signature: SignatureBytes,
    ) -> Self {
        Self {
            content_hash,
            previous,
            signer,
            signature,
        }
    }

    /// Hash of the block payload. The primary lookup key.
    #[must_use]
    pub const fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// Digest of the predecessor's signature, or zero at a chain start.
    #[must_use]
    pub const fn previous(&self) -> &ContentHash {
        &self.previous
    }

    /// Key that produced [`signature_bytes`](Self::signature_bytes).
    #[must_use]
    pub const fn signer(&self) -> &PublicKey {
        &self.signer
    }

    /// Raw Ed25519 signature.
    #[must_use]
    pub const fn signature_bytes(&self) -> &SignatureBytes {
        &self.signature
    }

    /// Whether this signature starts a chain.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.previous.is_zero()
    }

    /// The reference a successor stores in its `previous` field.
    ///
    /// Covers every field, so two signatures with equal digests are equal.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let mut data = Vec::with_capacity(DIGEST_INPUT_LEN);
        data.extend_from_slice(self.content_hash.as_bytes());
        data.extend_from_slice(self.previous.as_bytes());
        data.extend_from_slice(self.signer.as_bytes());
        data.extend_from_slice(self.signature.as_bytes());
        ContentHash::hash_with_domain(DIGEST_DOMAIN, &data)
    }

    /// Canonical bytes covered by the signature.
    #[must_use]
    pub fn signing_data(&self, payload_len: u64) -> Vec<u8> {
        signing_data(&self.content_hash, &self.previous, &self.signer, payload_len)
    }
}

/// Canonical signed encoding:
/// `domain || content_hash || previous || signer || payload_len (u64 LE)`.
pub(crate) fn signing_data(
    content_hash: &ContentHash,
    previous: &ContentHash,
    signer: &PublicKey,
    payload_len: u64,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(SIGNING_DATA_LEN);
    data.extend_from_slice(SIGNING_DOMAIN);
    data.extend_from_slice(content_hash.as_bytes());
    data.extend_from_slice(previous.as_bytes());
    data.extend_from_slice(signer.as_bytes());
    data.extend_from_slice(&payload_len.to_le_bytes());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(previous: ContentHash) -> Signature {
        Signature::new(
            ContentHash::hash(b"payload"),
            previous,
            PublicKey::from_bytes([3u8; 32]),
            SignatureBytes::from_bytes([9u8; 64]),
        )
    }

    #[test]
    fn test_genesis_detection() {
        assert!(sample(ContentHash::zero()).is_genesis());
        assert!(!sample(ContentHash::hash(b"p")).is_genesis());
    }

    #[test]
    fn test_digest_covers_every_field() {
        let base = sample(ContentHash::zero());
        let relinked = sample(ContentHash::hash(b"other"));
        let resigned = Signature::new(
            *base.content_hash(),
            *base.previous(),
            *base.signer(),
            SignatureBytes::from_bytes([8u8; 64]),
        );

        assert_eq!(base.digest(), sample(ContentHash::zero()).digest());
        assert_ne!(base.digest(), relinked.digest());
        assert_ne!(base.digest(), resigned.digest());
        assert_ne!(base.digest(), *base.content_hash());
    }

    #[test]
    fn test_signing_data_binds_length() {
        let sig = sample(ContentHash::zero());
        assert_ne!(sig.signing_data(7), sig.signing_data(8));
        assert!(sig.signing_data(0).starts_with(SIGNING_DOMAIN));
    }

    #[test]
    fn test_serde_roundtrip() {
        let sig = sample(ContentHash::hash(b"prev"));
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }
}
