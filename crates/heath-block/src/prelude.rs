//! Commonly used types: `use heath_block::prelude::*;`

pub use crate::{Block, BlockError, BlockResult, ContentHash, Signature};
pub use crate::{ChainError, ChainIssue, ChainVerifier, verify_chain};
