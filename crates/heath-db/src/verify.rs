//! Chain verification over a driver stream.

use heath_block::{ChainError, ChainVerifier};
use thiserror::Error;
use tracing::info;

use crate::driver::BlockStream;
use crate::error::DbError;

/// Why a stored chain failed verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A block is invalid or out of place.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The stream itself failed.
    #[error("stream failed after {verified} verified block(s): {source}")]
    Stream {
        /// Blocks verified before the failure.
        verified: usize,
        /// The terminal stream error.
        #[source]
        source: DbError,
    },
}

/// Verify every block of `stream` as one chain from genesis.
///
/// Stops reading at the first invalid block.
///
/// # Errors
///
/// Returns [`VerifyError::Chain`] for the first bad block, or
/// [`VerifyError::Stream`] if the stream ended with an error.
pub async fn verify_stream(stream: BlockStream) -> Result<usize, VerifyError> {
    verify_stream_with(stream, ChainVerifier::new()).await
}

/// As [`verify_stream`], with a preconfigured verifier.
///
/// # Errors
///
/// As for [`verify_stream`].
pub async fn verify_stream_with(
    mut stream: BlockStream,
    mut verifier: ChainVerifier,
) -> Result<usize, VerifyError> {
    while let Some(block) = stream.next().await {
        verifier.push(&block)?;
    }

    let verified = verifier.verified();
    stream
        .finish()
        .await
        .map_err(|source| VerifyError::Stream { verified, source })?;

    info!(blocks = verified, head = %verifier.head().short(), "chain verified");
    Ok(verified)
}
