//! The driver contract every storage backend implements.

use heath_block::Block;
use heath_crypto::ContentHash;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::{DbError, DbResult};

/// A persistence backend for signed blocks.
///
/// Drivers are safe to share across tasks. `write` and
/// `get_block_by_content_hash` may be called while a stream is running.
pub trait Driver: Send + Sync {
    /// Registry name of the backend.
    fn name(&self) -> &'static str;

    /// Durably append `block`.
    ///
    /// On error nothing is committed: later reads and streams never observe
    /// a partial record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Encode`] if the block cannot be framed,
    /// [`DbError::Closed`] after [`close`](Self::close), or the I/O error
    /// raised by the resource.
    fn write(&self, block: &Block) -> DbResult<()>;

    /// Fetch a stored block by its payload hash.
    ///
    /// If several stored blocks share the hash, the most recently written
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] when nothing matches, which callers can
    /// tell apart from storage failures with [`DbError::is_not_found`].
    fn get_block_by_content_hash(&self, hash: &ContentHash) -> DbResult<Block>;

    /// Stream every stored block in write order.
    ///
    /// The stream covers the blocks committed when it starts. Cancelling
    /// `cancel` stops production promptly and ends the stream with
    /// [`DbError::Cancelled`].
    fn stream_blocks(&self, cancel: CancellationToken) -> BlockStream;

    /// Number of readable blocks.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Closed`] after [`close`](Self::close).
    fn len(&self) -> DbResult<usize>;

    /// Whether no block is stored.
    ///
    /// # Errors
    ///
    /// As for [`len`](Self::len).
    fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Release the resource and run the close callback.
    ///
    /// The callback runs at most once. Closing again is a no-op. Running
    /// streams end with [`DbError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns the error raised while flushing or by the close callback.
    fn close(&self) -> DbResult<()>;
}

/// Blocks in write order plus the terminal outcome of the scan.
///
/// The terminal result is delivered only after the last block has been
/// sent, so draining the blocks and then calling [`finish`](Self::finish)
/// observes both in order.
#[derive(Debug)]
pub struct BlockStream {
    blocks: mpsc::Receiver<Block>,
    done: oneshot::Receiver<DbResult<()>>,
}

impl BlockStream {
    /// Wrap the two channels of a running producer.
    #[must_use]
    pub fn new(blocks: mpsc::Receiver<Block>, done: oneshot::Receiver<DbResult<()>>) -> Self {
        Self { blocks, done }
    }

    /// A stream that yields nothing and ends with `err`.
    #[must_use]
    pub fn failed(err: DbError) -> Self {
        let (_, blocks) = mpsc::channel(1);
        let (tx, done) = oneshot::channel();
        let _ = tx.send(Err(err));
        Self { blocks, done }
    }

    /// Next block, or `None` once the producer has stopped.
    pub async fn next(&mut self) -> Option<Block> {
        self.blocks.recv().await
    }

    /// Blocking variant of [`next`](Self::next) for synchronous callers.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_next(&mut self) -> Option<Block> {
        self.blocks.blocking_recv()
    }

    /// Wait for the terminal result.
    ///
    /// Calling this before draining the blocks detaches the consumer, and the
    /// producer stops with [`DbError::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns whatever error ended the scan.
    pub async fn finish(self) -> DbResult<()> {
        drop(self.blocks);
        self.done.await.unwrap_or(Err(DbError::StreamAborted))
    }

    /// Blocking variant of [`finish`](Self::finish).
    ///
    /// # Errors
    ///
    /// As for [`finish`](Self::finish).
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_finish(self) -> DbResult<()> {
        drop(self.blocks);
        self.done.blocking_recv().unwrap_or(Err(DbError::StreamAborted))
    }

    /// Drain every block, then return them if the scan succeeded.
    ///
    /// # Errors
    ///
    /// Returns the terminal error. Blocks received before it are discarded.
    pub async fn collect(mut self) -> DbResult<Vec<Block>> {
        let mut blocks = Vec::new();
        while let Some(block) = self.next().await {
            blocks.push(block);
        }
        self.finish().await?;
        Ok(blocks)
    }

    /// Split into the raw block and result channels.
    #[must_use]
    pub fn into_parts(self) -> (mpsc::Receiver<Block>, oneshot::Receiver<DbResult<()>>) {
        (self.blocks, self.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_stream_yields_nothing() {
        let mut stream = BlockStream::failed(DbError::Closed);
        assert!(stream.next().await.is_none());
        assert!(matches!(stream.finish().await, Err(DbError::Closed)));
    }

    #[tokio::test]
    async fn test_dropped_producer_reports_abort() {
        let (_, blocks) = mpsc::channel::<Block>(1);
        let (tx, done) = oneshot::channel::<DbResult<()>>();
        drop(tx);

        let stream = BlockStream::new(blocks, done);
        assert!(matches!(stream.collect().await, Err(DbError::StreamAborted)));
    }
}
