//! Storage error types.

use heath_crypto::ContentHash;
use thiserror::Error;

/// Errors returned by drivers and streams.
#[derive(Debug, Error)]
pub enum DbError {
    /// The underlying resource failed to read, write, seek or close.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A block could not be encoded for storage.
    #[error("encoding error: {0}")]
    Encode(String),

    /// The bytes at `offset` cannot be delimited as a record.
    #[error("decode error at offset {offset}: {reason}")]
    Decode {
        /// Byte offset of the record.
        offset: u64,
        /// What was wrong.
        reason: String,
    },

    /// A delimited record failed its checksum or could not be parsed.
    #[error("corrupt record at offset {offset}: {reason}")]
    Corrupt {
        /// Byte offset of the record.
        offset: u64,
        /// What was wrong.
        reason: String,
    },

    /// A scan finished but skipped records that failed to decode.
    #[error("{} corrupt record(s) skipped at offsets {offsets:?}", offsets.len())]
    CorruptRecords {
        /// Byte offsets of every skipped record.
        offsets: Vec<u64>,
    },

    /// No stored block has this content hash.
    #[error("no block with content hash {hash}")]
    NotFound {
        /// The hash looked up.
        hash: ContentHash,
    },

    /// The stream was cancelled before it completed.
    #[error("stream cancelled")]
    Cancelled,

    /// The driver has been closed.
    #[error("driver is closed")]
    Closed,

    /// A thread panicked while holding the driver lock.
    #[error("driver state lock poisoned")]
    Poisoned,

    /// The stream producer exited without reporting a result.
    #[error("stream producer aborted")]
    StreamAborted,

    /// No backend is registered under this name.
    #[error("unknown driver: {name}")]
    UnknownDriver {
        /// The requested backend name.
        name: String,
    },
}

impl DbError {
    /// Whether this is the expected not-found outcome of a lookup.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this is a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
