//! Opening file-backed logs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use heath_config::StoreConfig;
use tracing::debug;

use crate::driver::Driver;
use crate::error::DbResult;
use crate::log::DriverOptions;
use crate::registry;

/// A file whose `flush` optionally reaches the disk.
#[derive(Debug)]
struct LogFile {
    file: File,
    fsync: bool,
}

impl Read for LogFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.fsync {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

impl Seek for LogFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// Open or create the log at `path` with the backend registered as `driver`.
///
/// With `fsync` every append is synced to disk before it is committed.
/// Closing the driver syncs the file once more.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened, or the backend's
/// open error.
pub fn open_file(
    driver: &str,
    path: &Path,
    options: &DriverOptions,
    fsync: bool,
) -> DbResult<Box<dyn Driver>> {
    let factory = registry::factory(driver)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    let closer = file.try_clone()?;

    debug!(driver, path = %path.display(), fsync, "opening log file");
    factory(
        Box::new(LogFile { file, fsync }),
        Box::new(move || closer.sync_all()),
        options,
    )
}

/// Open the log described by a `[store]` config section.
///
/// # Errors
///
/// As for [`open_file`].
pub fn open_from_config(store: &StoreConfig) -> DbResult<Box<dyn Driver>> {
    let options = DriverOptions::default().with_stream_buffer(store.stream_buffer);
    open_file(&store.driver, &store.path, &options, store.fsync)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use heath_block::Block;
    use heath_crypto::KeyPair;

    #[test]
    fn test_file_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chain.log");
        let block = Block::new(None, &KeyPair::generate(), b"persisted".to_vec()).unwrap();

        let driver = open_file("binary", &path, &DriverOptions::default(), true).unwrap();
        driver.write(&block).unwrap();
        driver.close().unwrap();

        let driver = open_file("binary", &path, &DriverOptions::default(), false).unwrap();
        assert_eq!(driver.len().unwrap(), 1);
        assert_eq!(driver.get_block_by_content_hash(block.content_hash()).unwrap(), block);
        driver.close().unwrap();
    }

    #[test]
    fn test_unknown_driver_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.log");

        let Err(err) = open_file("nope", &path, &DriverOptions::default(), false) else {
            panic!("unknown driver opened");
        };
        assert!(matches!(err, DbError::UnknownDriver { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig {
            driver: "jsonl".to_string(),
            path: dir.path().join("chain.jsonl"),
            stream_buffer: 4,
            fsync: false,
        };

        let driver = open_from_config(&store).unwrap();
        assert_eq!(driver.name(), "jsonl");
        driver.close().unwrap();
    }
}
