//! Commonly used types.
//!
//! ```rust
//! use heath_crypto::prelude::*;
//!
//! let keypair = KeyPair::generate();
//! let hash = ContentHash::hash(b"hello");
//! assert!(!hash.is_zero());
//! # let _ = keypair;
//! ```

pub use crate::{ContentHash, CryptoError, CryptoResult};
pub use crate::{KeyId, KeyPair, PublicKey, Signer, TrustedKeys};
pub use crate::SignatureBytes;
