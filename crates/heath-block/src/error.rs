//! Block and chain error types.

use heath_crypto::{ContentHash, CryptoError, PublicKey};
use thiserror::Error;

/// Errors from constructing or validating a single block.
#[derive(Debug, Error)]
pub enum BlockError {
    /// The signer could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[source] CryptoError),

    /// The payload cannot be framed by the storage encodings.
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The recorded content hash does not match the payload.
    #[error("content hash mismatch: expected {expected}, payload hashes to {actual}")]
    HashMismatch {
        /// Hash recorded in the signature.
        expected: ContentHash,
        /// Hash of the payload actually carried.
        actual: ContentHash,
    },

    /// The signature does not verify under the recorded signer.
    #[error("invalid signature by {signer:?}: {source}")]
    InvalidSignature {
        /// Recorded signer.
        signer: PublicKey,
        /// Underlying verification failure.
        #[source]
        source: CryptoError,
    },
}

/// Result type for block operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Why a chain failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// The payload does not hash to the recorded content hash.
    HashMismatch {
        /// Recorded hash.
        expected: ContentHash,
        /// Hash of the payload.
        actual: ContentHash,
    },
    /// The signature does not verify.
    InvalidSignature {
        /// Recorded signer.
        signer: PublicKey,
    },
    /// The block's previous reference is not the accepted predecessor.
    BrokenLink {
        /// Digest of the prior accepted signature (zero for the first block).
        expected: ContentHash,
        /// Reference recorded in the block.
        actual: ContentHash,
    },
    /// The signer is not in the verifier's trusted key set.
    UntrustedSigner {
        /// Recorded signer.
        signer: PublicKey,
    },
}

impl std::fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashMismatch { expected, actual } => {
                write!(f, "bad hash: expected {expected}, payload hashes to {actual}")
            },
            Self::InvalidSignature { signer } => {
                write!(f, "bad signature by {}", signer.key_id_hex())
            },
            Self::BrokenLink { expected, actual } => {
                write!(f, "broken link: expected previous {expected}, found {actual}")
            },
            Self::UntrustedSigner { signer } => {
                write!(f, "untrusted signer {}", signer.key_id_hex())
            },
        }
    }
}

/// The first failure found while verifying a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chain verification failed at block {position}: {issue}")]
pub struct ChainError {
    /// Zero-based position of the offending block in the walked sequence.
    pub position: usize,
    /// What went wrong.
    pub issue: ChainIssue,
}
