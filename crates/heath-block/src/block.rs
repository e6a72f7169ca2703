//! Block construction and validation.

use heath_crypto::{ContentHash, Signer};
use tracing::trace;

use crate::error::{BlockError, BlockResult};
use crate::signature::{Signature, signing_data};

/// Largest payload a block may carry (16 MiB).
///
/// Every storage codec frames payloads with a 32-bit length, and a bound
/// well below that keeps a single record cheap to buffer during a scan.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// A payload and the signature binding it into a chain.
///
/// Blocks are immutable once built: construct them with [`Block::new`], or
/// reassemble stored parts with [`Block::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    payload: Vec<u8>,
    signature: Signature,
}

impl Block {
    /// Build and sign a block.
    ///
    /// `previous` is the signature of the chain predecessor, or `None` to
    /// start a new chain.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::PayloadTooLarge`] for payloads over
    /// [`MAX_PAYLOAD_LEN`], and [`BlockError::Signing`] if `signer` fails.
    pub fn new(
        previous: Option<&Signature>,
        signer: &impl Signer,
        payload: impl Into<Vec<u8>>,
    ) -> BlockResult<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(BlockError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let content_hash = ContentHash::hash(&payload);
        let previous = previous.map_or_else(ContentHash::zero, Signature::digest);
        let public_key = signer.public_key();

        let data = signing_data(&content_hash, &previous, &public_key, payload_len(&payload));
        let signature_bytes = signer.try_sign(&data).map_err(BlockError::Signing)?;

        trace!(
            content_hash = %content_hash.short(),
            previous = %previous.short(),
            len = payload.len(),
            "signed block"
        );

        Ok(Self {
            payload,
            signature: Signature::new(content_hash, previous, public_key, signature_bytes),
        })
    }

    /// Reassemble a block from stored parts without validating it.
    ///
    /// Call [`verify`](Self::verify) before trusting the result.
    #[must_use]
    pub fn from_parts(payload: Vec<u8>, signature: Signature) -> Self {
        Self { payload, signature }
    }

    /// The payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The block signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Shorthand for `signature().content_hash()`.
    #[must_use]
    pub const fn content_hash(&self) -> &ContentHash {
        self.signature.content_hash()
    }

    /// Split into payload and signature.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Signature) {
        (self.payload, self.signature)
    }

    /// Check that the content hash matches the payload and the signature
    /// verifies under the recorded signer.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError::HashMismatch`] or [`BlockError::InvalidSignature`].
    pub fn verify(&self) -> BlockResult<()> {
        let actual = ContentHash::hash(&self.payload);
        if actual != *self.signature.content_hash() {
            return Err(BlockError::HashMismatch {
                expected: *self.signature.content_hash(),
                actual,
            });
        }

        let signer = self.signature.signer();
        signer
            .verify(
                &self.signature.signing_data(payload_len(&self.payload)),
                self.signature.signature_bytes(),
            )
            .map_err(|source| BlockError::InvalidSignature {
                signer: *signer,
                source,
            })
    }

    /// Whether this block links directly to `previous`.
    #[must_use]
    pub fn follows(&self, previous: &Signature) -> bool {
        *self.signature.previous() == previous.digest()
    }
}

// Payload lengths are bounded by MAX_PAYLOAD_LEN, so the cast is lossless.
fn payload_len(payload: &[u8]) -> u64 {
    u64::try_from(payload.len()).unwrap_or(u64::MAX)
}
