//! In-memory resource for tests and ephemeral logs.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    bytes: Vec<u8>,
    /// Bytes that may still be written before writes start failing.
    write_budget: Option<usize>,
}

/// A growable byte buffer shared between handles.
///
/// Every clone sees the same bytes but keeps its own cursor, so a test can
/// hand one handle to a driver, keep another, and reopen the same contents
/// later. Writes past the end extend the buffer and writes inside it
/// overwrite in place.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Inner>>,
    pos: u64,
}

impl SharedBuffer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer holding `bytes`.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                bytes,
                write_budget: None,
            })),
            pos: 0,
        }
    }

    /// Current length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |inner| inner.bytes.len())
    }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the current contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().map(|inner| inner.bytes.clone()).unwrap_or_default()
    }

    /// Let only `bytes` more bytes be written, then fail every write.
    ///
    /// The write that crosses the limit is cut short, leaving a partial
    /// record behind. `None` lifts the limit.
    pub fn fail_writes_after(&self, bytes: Option<usize>) {
        if let Ok(mut inner) = self.lock() {
            inner.write_budget = bytes;
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("shared buffer lock poisoned"))
    }

    fn cursor(&self) -> io::Result<usize> {
        usize::try_from(self.pos).map_err(|_| io::Error::other("cursor past addressable memory"))
    }
}

impl Read for SharedBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.cursor()?;
        let inner = self.lock()?;
        let available = inner.bytes.get(start..).unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        drop(inner);
        self.pos = self.pos.saturating_add(n as u64);
        Ok(n)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let start = self.cursor()?;
        let mut inner = self.lock()?;

        let n = match inner.write_budget {
            Some(0) => return Err(io::Error::other("injected write failure")),
            Some(budget) => budget.min(buf.len()),
            None => buf.len(),
        };
        if let Some(budget) = inner.write_budget.as_mut() {
            *budget = budget.saturating_sub(n);
        }

        let end = start
            .checked_add(n)
            .ok_or_else(|| io::Error::other("write past addressable memory"))?;
        if inner.bytes.len() < end {
            inner.bytes.resize(end, 0);
        }
        inner.bytes[start..end].copy_from_slice(&buf[..n]);
        drop(inner);

        self.pos = self.pos.saturating_add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.lock()?.bytes.len() as u64;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of buffer")
        })?;
        self.pos = target;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_bytes_not_cursors() {
        let mut writer = SharedBuffer::new();
        let mut reader = writer.clone();

        writer.write_all(b"hello").unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();

        assert_eq!(out, "hello");
        assert_eq!(writer.len(), 5);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut buffer = SharedBuffer::from_bytes(b"abcdef".to_vec());
        buffer.seek(SeekFrom::Start(2)).unwrap();
        buffer.write_all(b"XY").unwrap();
        assert_eq!(buffer.to_vec(), b"abXYef");

        buffer.seek(SeekFrom::End(0)).unwrap();
        buffer.write_all(b"!").unwrap();
        assert_eq!(buffer.to_vec(), b"abXYef!");
    }

    #[test]
    fn test_seek_before_start_fails() {
        let mut buffer = SharedBuffer::new();
        assert!(buffer.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn test_injected_failure_leaves_partial_write() {
        let mut buffer = SharedBuffer::new();
        buffer.fail_writes_after(Some(3));

        assert!(buffer.write_all(b"abcdef").is_err());
        assert_eq!(buffer.to_vec(), b"abc");

        buffer.fail_writes_after(None);
        buffer.write_all(b"def").unwrap();
        assert_eq!(buffer.to_vec(), b"abcdef");
    }
}
