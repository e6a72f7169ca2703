//! Chain verification over blocks in persisted order.

use heath_crypto::{ContentHash, TrustedKeys};
use tracing::{debug, warn};

use crate::block::Block;
use crate::error::{BlockError, ChainError, ChainIssue};

/// Incremental chain verifier.
///
/// Feed blocks oldest first with [`push`](Self::push). The verifier keeps the
/// digest of the last accepted signature and rejects the first block that is
/// individually invalid or does not link to it. After a failure the verifier
/// stays failed: verification halts rather than attempting repair.
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    expected_previous: ContentHash,
    position: usize,
    trusted: Option<TrustedKeys>,
    failed: Option<ChainError>,
}

impl Default for ChainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainVerifier {
    /// A verifier expecting a chain rooted at the genesis sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expected_previous: ContentHash::zero(),
            position: 0,
            trusted: None,
            failed: None,
        }
    }

    /// Only accept blocks signed by one of `trusted`.
    #[must_use]
    pub fn with_trusted_keys(mut self, trusted: TrustedKeys) -> Self {
        self.trusted = Some(trusted);
        self
    }

    /// Number of blocks accepted so far.
    #[must_use]
    pub fn verified(&self) -> usize {
        self.position
    }

    /// Digest a successor of the last accepted block must reference.
    #[must_use]
    pub fn head(&self) -> ContentHash {
        self.expected_previous
    }

    /// Verify the next block.
    ///
    /// # Errors
    ///
    /// Returns a [`ChainError`] carrying the block's position and the reason.
    /// Once an error has been returned every later call returns it again.
    pub fn push(&mut self, block: &Block) -> Result<(), ChainError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }

        match self.check(block) {
            Ok(()) => {
                self.expected_previous = block.signature().digest();
                self.position = self.position.saturating_add(1);
                Ok(())
            },
            Err(issue) => {
                warn!(position = self.position, %issue, "chain verification failed");
                let err = ChainError {
                    position: self.position,
                    issue,
                };
                self.failed = Some(err.clone());
                Err(err)
            },
        }
    }

    fn check(&self, block: &Block) -> Result<(), ChainIssue> {
        let sig = block.signature();

        if let Some(trusted) = &self.trusted
            && !trusted.contains(sig.signer())
        {
            return Err(ChainIssue::UntrustedSigner {
                signer: *sig.signer(),
            });
        }

        block.verify().map_err(|e| match e {
            BlockError::HashMismatch { expected, actual } => {
                ChainIssue::HashMismatch { expected, actual }
            },
            _ => ChainIssue::InvalidSignature {
                signer: *sig.signer(),
            },
        })?;

        if *sig.previous() != self.expected_previous {
            return Err(ChainIssue::BrokenLink {
                expected: self.expected_previous,
                actual: *sig.previous(),
            });
        }

        Ok(())
    }
}

/// Verify a whole chain, returning how many blocks were checked.
///
/// # Errors
///
/// Returns the first [`ChainError`] encountered.
pub fn verify_chain<'a, I>(blocks: I) -> Result<usize, ChainError>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut verifier = ChainVerifier::new();
    for block in blocks {
        verifier.push(block)?;
    }
    debug!(blocks = verifier.verified(), "chain verified");
    Ok(verifier.verified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Signature;
    use heath_crypto::KeyPair;
    use rand::Rng;

    fn build_chain(keys: &[&KeyPair], len: usize) -> Vec<Block> {
        let mut rng = rand::thread_rng();
        let mut blocks: Vec<Block> = Vec::with_capacity(len);
        for i in 0..len {
            let key = keys[i % keys.len()];
            let payload: Vec<u8> = (0..rng.gen_range(0..64)).map(|_| rng.r#gen()).collect();
            let prev = blocks.last().map(Block::signature);
            blocks.push(Block::new(prev, key, payload).unwrap());
        }
        blocks
    }

    #[test]
    fn test_empty_chain_is_valid() {
        assert_eq!(verify_chain(std::iter::empty()).unwrap(), 0);
    }

    #[test]
    fn test_valid_chain() {
        let key = KeyPair::generate();
        let chain = build_chain(&[&key], 20);
        assert_eq!(verify_chain(&chain).unwrap(), 20);
    }

    #[test]
    fn test_chain_signed_by_rotating_keys() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let chain = build_chain(&[&a, &b], 10);
        assert_eq!(verify_chain(&chain).unwrap(), 10);
    }

    #[test]
    fn test_first_block_must_be_genesis() {
        let key = KeyPair::generate();
        let chain = build_chain(&[&key], 3);

        let err = verify_chain(&chain[1..]).unwrap_err();
        assert_eq!(err.position, 0);
        assert!(matches!(err.issue, ChainIssue::BrokenLink { expected, .. } if expected.is_zero()));
    }

    #[test]
    fn test_tampered_payload_fails_at_position() {
        let key = KeyPair::generate();
        let mut chain = build_chain(&[&key], 8);

        let (_, sig) = chain[5].clone().into_parts();
        chain[5] = Block::from_parts(b"rewritten history".to_vec(), sig);

        let err = verify_chain(&chain).unwrap_err();
        assert_eq!(err.position, 5);
        assert!(matches!(err.issue, ChainIssue::HashMismatch { .. }));
    }

    #[test]
    fn test_tampered_link_fails_at_position() {
        let key = KeyPair::generate();
        let mut chain = build_chain(&[&key], 8);

        // Re-sign block 3 so it is individually valid but points at block 1.
        let payload = chain[3].payload().to_vec();
        chain[3] = Block::new(Some(chain[1].signature()), &key, payload).unwrap();

        let err = verify_chain(&chain).unwrap_err();
        assert_eq!(err.position, 3);
        match err.issue {
            ChainIssue::BrokenLink { expected, actual } => {
                assert_eq!(expected, chain[2].signature().digest());
                assert_eq!(actual, chain[1].signature().digest());
            },
            other => panic!("unexpected issue: {other:?}"),
        }
    }

    #[test]
    fn test_forged_previous_reference_fails_signature() {
        let key = KeyPair::generate();
        let mut chain = build_chain(&[&key], 4);

        let (payload, sig) = chain[2].clone().into_parts();
        let forged = Signature::new(
            *sig.content_hash(),
            chain[0].signature().digest(),
            *sig.signer(),
            *sig.signature_bytes(),
        );
        chain[2] = Block::from_parts(payload, forged);

        let err = verify_chain(&chain).unwrap_err();
        assert_eq!(err.position, 2);
        assert!(matches!(err.issue, ChainIssue::InvalidSignature { .. }));
    }

    #[test]
    fn test_untrusted_signer() {
        let trusted_key = KeyPair::generate();
        let rogue = KeyPair::generate();
        let chain = build_chain(&[&trusted_key, &rogue], 4);

        let trusted = [trusted_key.export_public_key()].into_iter().collect();
        let mut verifier = ChainVerifier::new().with_trusted_keys(trusted);

        verifier.push(&chain[0]).unwrap();
        let err = verifier.push(&chain[1]).unwrap_err();
        assert_eq!(err.position, 1);
        assert!(matches!(err.issue, ChainIssue::UntrustedSigner { .. }));

        // Halts at the first failure.
        assert_eq!(verifier.push(&chain[2]).unwrap_err(), err);
        assert_eq!(verifier.verified(), 1);
    }
}
