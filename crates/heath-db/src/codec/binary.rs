//! Length-prefixed binary records with a CRC32 trailer.
//!
//! ```text
//! [magic "HBK1":4][body_len:u32][body][crc32:u32]
//! body = [content_hash:32][previous:32][signer:32][signature:64][payload_len:u32][payload]
//! ```
//!
//! Integers are little-endian. The CRC covers magic, length and body.

use std::io::{self, BufRead};

use heath_block::{Block, MAX_PAYLOAD_LEN, Signature};
use heath_crypto::{ContentHash, PublicKey, SignatureBytes};

use super::{Frame, RecordCodec, at_end, read_full};
use crate::error::{DbError, DbResult};

const MAGIC: [u8; 4] = *b"HBK1";
const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 4;
const FIXED_BODY_LEN: usize = 32 + 32 + 32 + 64 + 4;
const MAX_BODY_LEN: usize = FIXED_BODY_LEN + MAX_PAYLOAD_LEN;

/// The default, compact backend codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl RecordCodec for BinaryCodec {
    const NAME: &'static str = "binary";

    fn encode(&self, block: &Block, out: &mut Vec<u8>) -> DbResult<()> {
        let payload = block.payload();
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| DbError::Encode(format!("payload of {} bytes", payload.len())))?;
        let body_len = payload
            .len()
            .checked_add(FIXED_BODY_LEN)
            .filter(|len| *len <= MAX_BODY_LEN)
            .and_then(|len| u32::try_from(len).ok())
            .ok_or_else(|| DbError::Encode(format!("payload of {} bytes", payload.len())))?;

        let sig = block.signature();
        let start = out.len();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&body_len.to_le_bytes());
        out.extend_from_slice(sig.content_hash().as_bytes());
        out.extend_from_slice(sig.previous().as_bytes());
        out.extend_from_slice(sig.signer().as_bytes());
        out.extend_from_slice(sig.signature_bytes().as_bytes());
        out.extend_from_slice(&payload_len.to_le_bytes());
        out.extend_from_slice(payload);

        let crc = crc32fast::hash(&out[start..]);
        out.extend_from_slice(&crc.to_le_bytes());
        Ok(())
    }

    fn read_frame(&self, reader: &mut dyn BufRead) -> io::Result<Frame> {
        if at_end(reader)? {
            return Ok(Frame::End);
        }

        let mut header = [0u8; HEADER_LEN];
        if !read_full(reader, &mut header)? {
            return Ok(torn("truncated header"));
        }
        let (magic, len_bytes) = header.split_at(4);
        if magic != MAGIC {
            return Ok(torn("bad magic"));
        }
        let body_len = le_u32(len_bytes).map_or(usize::MAX, |len| {
            usize::try_from(len).unwrap_or(usize::MAX)
        });
        if !(FIXED_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Ok(torn(format!("implausible body length {body_len}")));
        }

        // Bounded above by MAX_BODY_LEN, so neither sum can overflow.
        let frame_len = HEADER_LEN.saturating_add(body_len).saturating_add(TRAILER_LEN);
        let mut frame = vec![0u8; frame_len];
        frame[..HEADER_LEN].copy_from_slice(&header);
        if !read_full(reader, &mut frame[HEADER_LEN..])? {
            return Ok(torn("truncated record"));
        }

        let len = u64::try_from(frame_len).unwrap_or(u64::MAX);
        let (covered, trailer) = frame.split_at(frame_len.saturating_sub(TRAILER_LEN));
        let block = if le_u32(trailer) == Some(crc32fast::hash(covered)) {
            decode_body(&covered[HEADER_LEN..])
        } else {
            Err("checksum mismatch".to_string())
        };

        Ok(Frame::Record { len, block })
    }

    fn next_candidate(&self, window: &[u8]) -> Option<usize> {
        window
            .get(1..)?
            .windows(MAGIC.len())
            .position(|w| w == MAGIC)
            .map(|i| i.saturating_add(1))
    }
}

fn torn(reason: impl Into<String>) -> Frame {
    Frame::Torn {
        reason: reason.into(),
    }
}

fn le_u32(bytes: &[u8]) -> Option<u32> {
    bytes.try_into().ok().map(u32::from_le_bytes)
}

fn decode_body(body: &[u8]) -> Result<Block, String> {
    let mut fields = Fields(body);
    let content_hash = fields.array::<32>().map(ContentHash::from_bytes);
    let previous = fields.array::<32>().map(ContentHash::from_bytes);
    let signer = fields.array::<32>().map(PublicKey::from_bytes);
    let signature = fields.array::<64>().map(SignatureBytes::from_bytes);
    let payload_len = fields.array::<4>().map(u32::from_le_bytes);

    let (Some(content_hash), Some(previous), Some(signer), Some(signature), Some(payload_len)) =
        (content_hash, previous, signer, signature, payload_len)
    else {
        return Err("body shorter than its fixed fields".to_string());
    };

    let payload = fields.rest();
    if usize::try_from(payload_len).ok() != Some(payload.len()) {
        return Err(format!(
            "payload length {payload_len} disagrees with body ({} bytes)",
            payload.len()
        ));
    }

    Ok(Block::from_parts(
        payload.to_vec(),
        Signature::new(content_hash, previous, signer, signature),
    ))
}

struct Fields<'a>(&'a [u8]);

impl<'a> Fields<'a> {
    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, tail) = self.0.split_at_checked(N)?;
        self.0 = tail;
        head.try_into().ok()
    }

    fn rest(self) -> &'a [u8] {
        self.0
    }
}
