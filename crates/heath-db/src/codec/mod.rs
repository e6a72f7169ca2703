//! Record codecs: how a block is framed inside a log resource.
//!
//! A codec turns a [`Block`] into one self-delimiting record and reads
//! records back from a byte stream. It distinguishes three outcomes when
//! reading, because recovery depends on them:
//!
//! * a clean end of data,
//! * a record that is fully delimited but whose contents are bad, which a
//!   scan can skip,
//! * bytes that cannot be delimited at all, typically a torn append at the
//!   tail, past which nothing can be trusted.

use std::io::{self, BufRead};

use heath_block::Block;
use heath_crypto::ContentHash;

use crate::error::DbResult;

mod binary;
mod jsonl;

pub use binary::BinaryCodec;
pub use jsonl::JsonLinesCodec;

/// Result of reading one record.
#[derive(Debug)]
pub enum Frame {
    /// No more bytes.
    End,
    /// A delimited record occupying `len` bytes.
    Record {
        /// Bytes the record occupies, framing included.
        len: u64,
        /// The decoded block, or why the contents are unusable.
        block: Result<Block, String>,
    },
    /// The bytes at this position cannot be delimited as a record.
    Torn {
        /// What was wrong.
        reason: String,
    },
}

/// Encoding of blocks as self-delimiting records.
pub trait RecordCodec: Default + Send + Sync + 'static {
    /// Registry name of the backend using this codec.
    const NAME: &'static str;

    /// Encode `block` into `out` as one complete record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Encode`](crate::DbError::Encode) if the block cannot
    /// be represented.
    fn encode(&self, block: &Block, out: &mut Vec<u8>) -> DbResult<()>;

    /// Read the record starting at the current position of `reader`.
    ///
    /// # Errors
    ///
    /// Only I/O failures other than a short read are errors. A short read is
    /// reported as [`Frame::Torn`].
    fn read_frame(&self, reader: &mut dyn BufRead) -> io::Result<Frame>;

    /// Index of the first position in `window`, past its first byte, where a
    /// record could start.
    ///
    /// Used to step over bytes that cannot be delimited. A candidate is only
    /// a hint: the caller still decodes it before trusting it.
    fn next_candidate(&self, window: &[u8]) -> Option<usize>;
}

/// Fill `buf` completely, or report how it came up short.
///
/// Returns `Ok(false)` if the reader hit end of data first.
pub(crate) fn read_full(reader: &mut dyn BufRead, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Whether `reader` has no bytes left.
pub(crate) fn at_end(reader: &mut dyn BufRead) -> io::Result<bool> {
    Ok(reader.fill_buf()?.is_empty())
}

/// Encode `block` with `codec` into a fresh buffer.
pub(crate) fn encode_to_vec<C: RecordCodec>(codec: &C, block: &Block) -> DbResult<Vec<u8>> {
    let mut out = Vec::new();
    codec.encode(block, &mut out)?;
    Ok(out)
}

/// Reject a decoded block whose payload does not match its content hash.
///
/// Codecs without their own checksum rely on this to tell a damaged record
/// from a good one.
pub(crate) fn check_content(frame: Frame) -> Frame {
    match frame {
        Frame::Record {
            len,
            block: Ok(block),
        } if ContentHash::hash(block.payload()) != *block.content_hash() => Frame::Record {
            len,
            block: Err("payload does not match content hash".to_string()),
        },
        other => other,
    }
}
