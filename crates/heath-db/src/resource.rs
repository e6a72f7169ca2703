//! The seekable resource a driver persists into, and its close callback.

use std::io::{self, Read, Seek, Write};

/// Anything a driver can persist blocks into.
///
/// Implemented for every `Read + Write + Seek + Send` type: files, in-memory
/// cursors, [`SharedBuffer`](crate::SharedBuffer). A driver calls `flush`
/// after every append, so wrappers that need an fsync put it there.
pub trait Resource: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> Resource for T {}

/// Callback run exactly once when a driver is closed.
pub type CloseFn = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// A close callback that does nothing.
#[must_use]
pub fn noop_close() -> CloseFn {
    Box::new(|| Ok(()))
}
