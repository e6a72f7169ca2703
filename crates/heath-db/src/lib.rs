//! Heath DB - storage drivers for signed block chains.
//!
//! This crate provides:
//! - The [`Driver`] contract every storage backend implements
//! - [`LogDriver`], an append-only log over any seekable [`Resource`], with
//!   a compact binary and a JSON lines [`RecordCodec`]
//! - A [`registry`] of named backends, so one test suite or tool can run
//!   against all of them
//! - [`SharedBuffer`], an in-memory resource with write fault injection
//! - [`verify_stream`] for checking a stored chain end to end
//!
//! # Example
//!
//! ```
//! use heath_block::Block;
//! use heath_crypto::KeyPair;
//! use heath_db::{SharedBuffer, noop_close, registry};
//!
//! let driver = registry::open("binary", Box::new(SharedBuffer::new()), noop_close()).unwrap();
//! let block = Block::new(None, &KeyPair::generate(), b"hello".to_vec()).unwrap();
//!
//! driver.write(&block).unwrap();
//! let found = driver.get_block_by_content_hash(block.content_hash()).unwrap();
//! assert_eq!(found.payload(), b"hello");
//! driver.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod registry;

mod codec;
mod driver;
mod error;
mod log;
mod memory;
mod open;
mod resource;
mod verify;

pub use codec::{BinaryCodec, Frame, JsonLinesCodec, RecordCodec};
pub use driver::{BlockStream, Driver};
pub use error::{DbError, DbResult};
pub use log::{DEFAULT_STREAM_BUFFER, DriverOptions, LogDriver};
pub use memory::SharedBuffer;
pub use open::{open_file, open_from_config};
pub use registry::{DEFAULT_DRIVER, DriverFactory};
pub use resource::{CloseFn, Resource, noop_close};
pub use verify::{VerifyError, verify_stream, verify_stream_with};
