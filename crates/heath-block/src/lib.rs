//! Heath Block - signed, chain-linked blocks.
//!
//! This crate provides:
//! - The [`Signature`] record carried by every block
//! - [`Block`] construction, validation and chain linking
//! - [`ChainVerifier`] for walking a sequence of blocks in persisted order
//!
//! # Chain Model
//!
//! Every block signs `(content_hash, previous, signer, payload_len)` where
//! `previous` is the digest of the predecessor's [`Signature`], or the
//! all-zero genesis sentinel for the first block. Changing any historical
//! payload or link breaks the signature or the next link, and the break is
//! reported at its exact position.
//!
//! # Example
//!
//! ```
//! use heath_block::{Block, verify_chain};
//! use heath_crypto::KeyPair;
//!
//! let key = KeyPair::generate();
//! let genesis = Block::new(None, &key, b"a".to_vec()).unwrap();
//! let next = Block::new(Some(genesis.signature()), &key, b"b".to_vec()).unwrap();
//!
//! assert_eq!(verify_chain([&genesis, &next]).unwrap(), 2);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod block;
mod chain;
mod error;
mod signature;

pub use block::{Block, MAX_PAYLOAD_LEN};
pub use chain::{ChainVerifier, verify_chain};
pub use error::{BlockError, BlockResult, ChainError, ChainIssue};
pub use signature::Signature;

pub use heath_crypto::ContentHash;
