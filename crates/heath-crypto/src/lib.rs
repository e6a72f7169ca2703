//! Heath Crypto - signing keys and content hashing for the block log.
//!
//! This crate provides:
//! - Ed25519 key pairs with zeroized secret material
//! - The [`Signer`] seam used when constructing blocks
//! - BLAKE3 content hashes used as lookup keys and chain links
//! - A [`TrustedKeys`] set for restricting which signers a chain accepts
//!
//! # Example
//!
//! ```
//! use heath_crypto::{ContentHash, KeyPair, Signer};
//!
//! let keypair = KeyPair::generate();
//! let signature = keypair.try_sign(b"payload").unwrap();
//! assert!(keypair.export_public_key().verify(b"payload", &signature).is_ok());
//!
//! // Same bytes, same hash.
//! assert_eq!(ContentHash::hash(b"payload"), ContentHash::hash(b"payload"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;
mod keypair;
mod signature;
mod trusted;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use keypair::{KeyPair, PublicKey, Signer};
pub use signature::SignatureBytes;
pub use trusted::{KeyId, TrustedKeys};
