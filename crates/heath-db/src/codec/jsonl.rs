//! Newline-delimited JSON records, one block per line.
//!
//! Hashes are hex, keys, signatures and payloads are base64. The format is
//! meant to be greppable and diffable rather than compact.

use std::io::{self, BufRead};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use heath_block::{Block, MAX_PAYLOAD_LEN, Signature};
use serde::{Deserialize, Serialize};

use super::{Frame, RecordCodec};
use crate::error::{DbError, DbResult};

/// Human-readable backend codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

#[derive(Serialize)]
struct RecordRef<'a> {
    #[serde(flatten)]
    signature: &'a Signature,
    payload: String,
}

#[derive(Deserialize)]
struct Record {
    #[serde(flatten)]
    signature: Signature,
    payload: String,
}

impl RecordCodec for JsonLinesCodec {
    const NAME: &'static str = "jsonl";

    fn encode(&self, block: &Block, out: &mut Vec<u8>) -> DbResult<()> {
        let record = RecordRef {
            signature: block.signature(),
            payload: BASE64.encode(block.payload()),
        };
        serde_json::to_writer(&mut *out, &record).map_err(|e| DbError::Encode(e.to_string()))?;
        out.push(b'\n');
        Ok(())
    }

    fn read_frame(&self, reader: &mut dyn BufRead) -> io::Result<Frame> {
        let mut line = Vec::new();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(Frame::End);
        }
        if line.last() != Some(&b'\n') {
            return Ok(Frame::Torn {
                reason: "unterminated line".to_string(),
            });
        }

        Ok(Frame::Record {
            len: u64::try_from(read).unwrap_or(u64::MAX),
            block: decode_line(&line),
        })
    }

    fn next_candidate(&self, window: &[u8]) -> Option<usize> {
        window
            .iter()
            .position(|b| *b == b'\n')
            .map(|i| i.saturating_add(1))
    }
}

fn decode_line(line: &[u8]) -> Result<Block, String> {
    let record: Record = serde_json::from_slice(line).map_err(|e| e.to_string())?;
    let payload = BASE64
        .decode(record.payload.as_bytes())
        .map_err(|e| format!("payload: {e}"))?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(format!("payload of {} bytes exceeds limit", payload.len()));
    }
    Ok(Block::from_parts(payload, record.signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heath_crypto::KeyPair;

    fn encode(block: &Block) -> Vec<u8> {
        let mut out = Vec::new();
        JsonLinesCodec.encode(block, &mut out).unwrap();
        out
    }

    #[test]
    fn test_one_line_per_block() {
        let block = Block::new(None, &KeyPair::generate(), b"line\nbreaks\n".to_vec()).unwrap();
        let out = encode(&block);

        assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 1);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["content_hash"], block.content_hash().to_hex());
        assert!(value["payload"].is_string());

        match JsonLinesCodec.read_frame(&mut &out[..]).unwrap() {
            Frame::Record { len, block: Ok(decoded) } => {
                assert_eq!(len, out.len() as u64);
                assert_eq!(decoded, block);
            },
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_line_is_torn() {
        let block = Block::new(None, &KeyPair::generate(), b"x".to_vec()).unwrap();
        let out = encode(&block);
        let frame = JsonLinesCodec.read_frame(&mut &out[..out.len() - 1]).unwrap();
        assert!(matches!(frame, Frame::Torn { .. }));
    }

    #[test]
    fn test_bad_line_is_corrupt_but_delimited() {
        let bytes = b"{\"content_hash\": 7}\n";
        match JsonLinesCodec.read_frame(&mut &bytes[..]).unwrap() {
            Frame::Record { len, block: Err(_) } => assert_eq!(len, bytes.len() as u64),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_next_candidate_is_next_line() {
        assert_eq!(JsonLinesCodec.next_candidate(b"garbage\n{}\n"), Some(8));
        assert_eq!(JsonLinesCodec.next_candidate(b"\n"), Some(1));
        assert_eq!(JsonLinesCodec.next_candidate(b"no newline"), None);
    }

    #[test]
    fn test_empty_input_is_end() {
        assert!(matches!(
            JsonLinesCodec.read_frame(&mut &b""[..]).unwrap(),
            Frame::End
        ));
    }
}
