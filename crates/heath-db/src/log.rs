//! Append-only block log over a single seekable resource.
//!
//! Records are appended at the committed end of the resource. Opening a log
//! scans it once to rebuild the content-hash index and find that end:
//!
//! - a record that is delimited but damaged is logged and skipped,
//! - bytes that cannot be delimited are skipped up to the next intact record
//!   and reported as corrupt,
//! - if no intact record follows them they mark a torn tail, which is
//!   excluded and overwritten by the next append.
//!
//! The committed end only advances after a record has been written and
//! flushed in full, so a failed append is never visible to readers.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, BufReader, Read, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use heath_block::Block;
use heath_crypto::ContentHash;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::{Frame, RecordCodec, check_content, encode_to_vec};
use crate::driver::{BlockStream, Driver};
use crate::error::{DbError, DbResult};
use crate::resource::{CloseFn, Resource};

/// Default capacity of the channel between a stream producer and consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Bytes searched per read while looking for the next intact record.
const RESYNC_WINDOW: u64 = 64 * 1024;

/// Bytes shared by consecutive search windows, so a record start split
/// across two windows is still seen.
const RESYNC_OVERLAP: usize = 8;

/// Tunables shared by every log backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Blocks buffered ahead of a slow stream consumer.
    pub stream_buffer: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl DriverOptions {
    /// Set the stream buffer capacity. Zero is treated as one.
    #[must_use]
    pub fn with_stream_buffer(mut self, blocks: usize) -> Self {
        self.stream_buffer = blocks;
        self
    }
}

struct State {
    resource: Option<Box<dyn Resource>>,
    close: Option<CloseFn>,
    /// Offset one past the last committed record.
    end: u64,
    /// Offset of the latest record for each content hash.
    index: HashMap<ContentHash, u64>,
    records: usize,
}

/// A [`Driver`] storing blocks as consecutive records framed by `C`.
pub struct LogDriver<C> {
    codec: Arc<C>,
    state: Arc<Mutex<State>>,
    /// Undelimitable spans found at open, by start offset, with their length.
    damaged: Arc<BTreeMap<u64, u64>>,
    shutdown: CancellationToken,
    stream_buffer: usize,
}

impl<C> fmt::Debug for LogDriver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogDriver")
            .field("stream_buffer", &self.stream_buffer)
            .field("damaged_spans", &self.damaged.len())
            .field("closed", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<C: RecordCodec> LogDriver<C> {
    /// Open a log stored in `resource`, which may be empty.
    ///
    /// `close` runs exactly once, when the driver is closed, or immediately
    /// if opening fails.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while scanning the resource.
    pub fn open(
        mut resource: Box<dyn Resource>,
        close: CloseFn,
        options: &DriverOptions,
    ) -> DbResult<Self> {
        let codec = C::default();
        let scan = match scan(&codec, resource.as_mut()) {
            Ok(scan) => scan,
            Err(e) => {
                drop(resource);
                if let Err(close_err) = close() {
                    warn!(error = %close_err, "close callback failed after open error");
                }
                return Err(e);
            },
        };

        info!(
            driver = C::NAME,
            records = scan.records,
            end = scan.end,
            corrupt = scan.corrupt,
            "opened block log"
        );

        Ok(Self {
            codec: Arc::new(codec),
            state: Arc::new(Mutex::new(State {
                resource: Some(resource),
                close: Some(close),
                end: scan.end,
                index: scan.index,
                records: scan.records,
            })),
            damaged: Arc::new(scan.damaged),
            shutdown: CancellationToken::new(),
            stream_buffer: options.stream_buffer.max(1),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| DbError::Poisoned)
    }
}

impl<C: RecordCodec> Driver for LogDriver<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn write(&self, block: &Block) -> DbResult<()> {
        let record = encode_to_vec(self.codec.as_ref(), block)?;
        let len = u64::try_from(record.len())
            .map_err(|_| DbError::Encode(format!("record of {} bytes", record.len())))?;

        let mut state = self.lock()?;
        let offset = state.end;
        let new_end = offset
            .checked_add(len)
            .ok_or_else(|| DbError::Encode("log offset overflow".to_string()))?;
        let Some(resource) = state.resource.as_mut() else {
            return Err(DbError::Closed);
        };

        if let Err(e) = append(resource.as_mut(), offset, &record) {
            error!(driver = C::NAME, offset, error = %e, "append failed, record not committed");
            return Err(e.into());
        }

        state.end = new_end;
        state.index.insert(*block.content_hash(), offset);
        state.records = state.records.saturating_add(1);
        debug!(
            driver = C::NAME,
            offset,
            len,
            content_hash = %block.content_hash().short(),
            "appended block"
        );
        Ok(())
    }

    fn get_block_by_content_hash(&self, hash: &ContentHash) -> DbResult<Block> {
        let mut state = self.lock()?;
        let end = state.end;
        let offset = state.index.get(hash).copied();
        let Some(resource) = state.resource.as_mut() else {
            return Err(DbError::Closed);
        };
        let Some(offset) = offset else {
            return Err(DbError::NotFound { hash: *hash });
        };

        match read_at(self.codec.as_ref(), resource.as_mut(), offset, end)? {
            Frame::Record { block: Ok(block), .. } if block.content_hash() == hash => Ok(block),
            Frame::Record { block: Ok(_), .. } => Err(DbError::Corrupt {
                offset,
                reason: "indexed record holds a different block".to_string(),
            }),
            Frame::Record {
                block: Err(reason), ..
            } => Err(DbError::Corrupt { offset, reason }),
            Frame::Torn { reason } => Err(DbError::Decode { offset, reason }),
            Frame::End => Err(DbError::Decode {
                offset,
                reason: "indexed record past end of log".to_string(),
            }),
        }
    }

    fn stream_blocks(&self, cancel: CancellationToken) -> BlockStream {
        let end = match self.lock() {
            Ok(state) if state.resource.is_some() => state.end,
            Ok(_) => return BlockStream::failed(DbError::Closed),
            Err(e) => return BlockStream::failed(e),
        };

        let (tx, blocks) = mpsc::channel(self.stream_buffer);
        let (done_tx, done) = oneshot::channel();
        let producer = Producer {
            codec: Arc::clone(&self.codec),
            state: Arc::clone(&self.state),
            damaged: Arc::clone(&self.damaged),
            end,
            cancel,
            shutdown: self.shutdown.clone(),
            tx,
        };

        let spawned = thread::Builder::new()
            .name(format!("heath-{}-stream", C::NAME))
            .spawn(move || {
                let result = match tokio::runtime::Builder::new_current_thread().build() {
                    Ok(runtime) => runtime.block_on(producer.run()),
                    Err(e) => Err(DbError::Io(e)),
                };
                if let Err(e) = &result {
                    debug!(driver = C::NAME, error = %e, "block stream ended early");
                }
                let _ = done_tx.send(result);
            });

        match spawned {
            Ok(_) => BlockStream::new(blocks, done),
            Err(e) => {
                error!(driver = C::NAME, error = %e, "failed to spawn stream producer");
                BlockStream::failed(DbError::Io(e))
            },
        }
    }

    fn len(&self) -> DbResult<usize> {
        let state = self.lock()?;
        if state.resource.is_none() {
            return Err(DbError::Closed);
        }
        Ok(state.records)
    }

    fn close(&self) -> DbResult<()> {
        let (resource, close) = {
            let mut state = self.lock()?;
            (state.resource.take(), state.close.take())
        };
        self.shutdown.cancel();

        let Some(mut resource) = resource else {
            return Ok(());
        };
        let flushed = resource.flush();
        drop(resource);
        let closed = close.map_or(Ok(()), |close| close());

        flushed?;
        closed?;
        info!(driver = C::NAME, "closed block log");
        Ok(())
    }
}

#[derive(Default)]
struct Scan {
    end: u64,
    index: HashMap<ContentHash, u64>,
    records: usize,
    corrupt: usize,
    damaged: BTreeMap<u64, u64>,
}

fn scan<C: RecordCodec>(codec: &C, resource: &mut dyn Resource) -> DbResult<Scan> {
    let total = resource.seek(SeekFrom::End(0))?;

    let mut scan = Scan::default();
    while let Some((offset, reason)) = scan_run(codec, resource, total, &mut scan)? {
        match resync(codec, resource, offset, total)? {
            Some(next) => {
                let len = next.saturating_sub(offset);
                warn!(driver = C::NAME, offset, len, %reason, "skipping damaged span");
                scan.damaged.insert(offset, len);
                scan.corrupt = scan.corrupt.saturating_add(1);
                scan.end = next;
            },
            None => {
                warn!(
                    driver = C::NAME,
                    offset,
                    discarded = total.saturating_sub(offset),
                    %reason,
                    "discarding torn tail"
                );
                break;
            },
        }
    }
    Ok(scan)
}

/// Index consecutive records starting at `scan.end`.
///
/// Returns the offset and reason of the first bytes that cannot be
/// delimited, or `None` once the data ends cleanly.
fn scan_run<C: RecordCodec>(
    codec: &C,
    resource: &mut dyn Resource,
    total: u64,
    scan: &mut Scan,
) -> DbResult<Option<(u64, String)>> {
    resource.seek(SeekFrom::Start(scan.end))?;
    let remaining = total.saturating_sub(scan.end);
    let mut reader = BufReader::new(Read::take(&mut *resource, remaining));

    loop {
        let offset = scan.end;
        match check_content(codec.read_frame(&mut reader)?) {
            Frame::End => return Ok(None),
            Frame::Record { len, block } => {
                match block {
                    Ok(block) => {
                        scan.index.insert(*block.content_hash(), offset);
                        scan.records = scan.records.saturating_add(1);
                    },
                    Err(reason) => {
                        warn!(driver = C::NAME, offset, %reason, "skipping corrupt record");
                        scan.corrupt = scan.corrupt.saturating_add(1);
                    },
                }
                scan.end = offset.saturating_add(len);
            },
            Frame::Torn { reason } => return Ok(Some((offset, reason))),
        }
    }
}

/// Offset of the first intact record after the undelimitable bytes at
/// `from`, or `None` if nothing intact follows them.
fn resync<C: RecordCodec>(
    codec: &C,
    resource: &mut dyn Resource,
    from: u64,
    total: u64,
) -> DbResult<Option<u64>> {
    let mut start = from.saturating_add(1);
    let mut window = Vec::new();

    while start < total {
        resource.seek(SeekFrom::Start(start))?;
        window.clear();
        Read::take(&mut *resource, RESYNC_WINDOW).read_to_end(&mut window)?;
        let read = u64::try_from(window.len()).unwrap_or(u64::MAX);

        let Some(found) = codec.next_candidate(&window) else {
            if start.saturating_add(read) >= total {
                return Ok(None);
            }
            let step = window.len().saturating_sub(RESYNC_OVERLAP).max(1);
            start = start.saturating_add(u64::try_from(step).unwrap_or(u64::MAX));
            continue;
        };

        let candidate = start.saturating_add(u64::try_from(found).unwrap_or(u64::MAX));
        if let Frame::Record { block: Ok(_), .. } = read_at(codec, resource, candidate, total)? {
            return Ok(Some(candidate));
        }
        start = candidate;
    }
    Ok(None)
}

fn append(resource: &mut dyn Resource, offset: u64, record: &[u8]) -> io::Result<()> {
    resource.seek(SeekFrom::Start(offset))?;
    resource.write_all(record)?;
    resource.flush()
}

/// Read the record at `offset` without looking past `end`.
fn read_at<C: RecordCodec>(
    codec: &C,
    resource: &mut dyn Resource,
    offset: u64,
    end: u64,
) -> DbResult<Frame> {
    resource.seek(SeekFrom::Start(offset))?;
    let limit = end.saturating_sub(offset);
    let mut reader = BufReader::new(Read::take(resource, limit));
    Ok(check_content(codec.read_frame(&mut reader)?))
}

/// Walks a snapshot of the log on a dedicated thread.
///
/// The state lock is taken per record, so writers and lookups interleave
/// with a running stream.
struct Producer<C> {
    codec: Arc<C>,
    state: Arc<Mutex<State>>,
    damaged: Arc<BTreeMap<u64, u64>>,
    end: u64,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    tx: mpsc::Sender<Block>,
}

impl<C: RecordCodec> Producer<C> {
    async fn run(self) -> DbResult<()> {
        let mut offset = 0u64;
        let mut corrupt = Vec::new();

        while offset < self.end {
            if self.cancel.is_cancelled() {
                return Err(DbError::Cancelled);
            }
            if self.shutdown.is_cancelled() {
                return Err(DbError::Closed);
            }

            let len = match self.read(offset)? {
                Frame::Record { len, block } => {
                    match block {
                        Ok(block) => self.send(block).await?,
                        Err(reason) => {
                            warn!(driver = C::NAME, offset, %reason, "stream skipped corrupt record");
                            corrupt.push(offset);
                        },
                    }
                    len
                },
                Frame::Torn { reason } => match self.damaged.get(&offset) {
                    Some(len) => {
                        warn!(driver = C::NAME, offset, %reason, "stream skipped damaged span");
                        corrupt.push(offset);
                        *len
                    },
                    None => return Err(DbError::Decode { offset, reason }),
                },
                Frame::End => {
                    return Err(DbError::Decode {
                        offset,
                        reason: "log shorter than its committed end".to_string(),
                    });
                },
            };
            offset = offset.saturating_add(len);
        }

        if corrupt.is_empty() {
            Ok(())
        } else {
            Err(DbError::CorruptRecords { offsets: corrupt })
        }
    }

    fn read(&self, offset: u64) -> DbResult<Frame> {
        let mut state = self.state.lock().map_err(|_| DbError::Poisoned)?;
        let resource = state.resource.as_mut().ok_or(DbError::Closed)?;
        read_at(self.codec.as_ref(), resource.as_mut(), offset, self.end)
    }

    async fn send(&self, block: Block) -> DbResult<()> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DbError::Cancelled),
            () = self.shutdown.cancelled() => Err(DbError::Closed),
            sent = self.tx.send(block) => sent.map_err(|_| DbError::Cancelled),
        }
    }
}
