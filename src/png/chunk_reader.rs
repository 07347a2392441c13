//! Streaming reader over the text chunks of a PNG buffer.
//!
//! The reader never fails as a whole: a truncated file ends the sequence,
//! and a malformed or undecodable chunk is logged and skipped.

use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::Serialize;
use thiserror::Error;

/// The eight signature bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Upper bound on the inflated size of a single compressed chunk.
pub const DEFAULT_INFLATE_LIMIT: usize = 8 * 1024 * 1024;

const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_CRC_LEN: usize = 4;

/// Which text chunk type a [`TextChunk`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextChunkKind {
    #[serde(rename = "tEXt")]
    Text,
    #[serde(rename = "zTXt")]
    CompressedText,
    #[serde(rename = "iTXt")]
    InternationalText,
}

/// One decoded keyword/text pair, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
    pub kind: TextChunkKind,
}

/// Reasons a single text chunk is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    /// No `\0` after the keyword.
    #[error("missing keyword separator")]
    MissingKeyword,

    /// Compression bytes or the `iTXt` language/translation separators are missing.
    #[error("malformed chunk header")]
    MalformedHeader,

    /// Only method 0 (zlib) is defined.
    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u8),

    /// The compressed stream was corrupt or inflated past the size limit.
    #[error("decompression failed: {0}")]
    DecompressionFailure(String),
}

/// Iterator over the text chunks of a PNG byte buffer.
///
/// The buffer is expected to start with [`PNG_SIGNATURE`]; it is skipped
/// without being checked. Iteration stops at `IEND`, at the end of the
/// buffer, or at the first chunk whose declared length overruns the buffer.
pub struct ChunkReader<'a> {
    buf: &'a [u8],
    offset: usize,
    inflate_limit: usize,
    done: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: PNG_SIGNATURE.len(),
            inflate_limit: DEFAULT_INFLATE_LIMIT,
            done: false,
        }
    }

    /// Builder: cap the inflated size of any one compressed chunk.
    pub fn with_inflate_limit(mut self, limit: usize) -> Self {
        self.inflate_limit = limit;
        self
    }

    /// Advance over the next raw chunk, returning its type code and payload.
    fn next_raw(&mut self) -> Option<([u8; 4], &'a [u8])> {
        if self.done {
            return None;
        }
        let buf = self.buf;

        let header_end = match self.offset.checked_add(CHUNK_HEADER_LEN) {
            Some(end) if end <= buf.len() => end,
            _ => return self.finish(),
        };
        let header = &buf[self.offset..header_end];
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let chunk_type = [header[4], header[5], header[6], header[7]];

        if &chunk_type == b"IEND" {
            return self.finish();
        }

        let payload_end = match header_end.checked_add(length) {
            Some(end) if end <= buf.len() => end,
            _ => {
                log::debug!(
                    "PNG chunk {} at offset {} declares {} bytes past the buffer end",
                    String::from_utf8_lossy(&chunk_type),
                    self.offset,
                    length
                );
                return self.finish();
            }
        };

        // The CRC is skipped unverified; a missing trailing CRC just ends
        // the walk on the next call.
        self.offset = payload_end.saturating_add(CHUNK_CRC_LEN);
        Some((chunk_type, &buf[header_end..payload_end]))
    }

    fn finish<T>(&mut self) -> Option<T> {
        self.done = true;
        None
    }

    fn decode(&self, chunk_type: &[u8; 4], payload: &[u8]) -> Option<Result<TextChunk, ChunkError>> {
        match chunk_type {
            b"tEXt" => Some(decode_text(payload)),
            b"zTXt" => Some(decode_compressed_text(payload, self.inflate_limit)),
            b"iTXt" => Some(decode_international_text(payload, self.inflate_limit)),
            _ => None,
        }
    }
}

impl Iterator for ChunkReader<'_> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        loop {
            let (chunk_type, payload) = self.next_raw()?;
            match self.decode(&chunk_type, payload) {
                Some(Ok(chunk)) => return Some(chunk),
                Some(Err(e)) => {
                    log::debug!(
                        "Dropping {} chunk: {}",
                        String::from_utf8_lossy(&chunk_type),
                        e
                    );
                }
                None => {}
            }
        }
    }
}

/// Collect every decodable text chunk of `buf` in file order.
pub fn read_text_chunks(buf: &[u8]) -> Vec<TextChunk> {
    ChunkReader::new(buf).collect()
}

// ---------------------------------------------------------------------------
// Chunk payload decoders
// ---------------------------------------------------------------------------

/// Split `keyword \0 rest`, decoding the keyword as UTF-8.
fn split_keyword(payload: &[u8]) -> Result<(String, &[u8]), ChunkError> {
    let nul = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or(ChunkError::MissingKeyword)?;
    let keyword = String::from_utf8_lossy(&payload[..nul]).into_owned();
    Ok((keyword, &payload[nul + 1..]))
}

/// `tEXt`: text is Latin-1.
fn decode_text(payload: &[u8]) -> Result<TextChunk, ChunkError> {
    let (keyword, rest) = split_keyword(payload)?;
    let text = rest.iter().map(|&b| char::from(b)).collect();
    Ok(TextChunk {
        keyword,
        text,
        kind: TextChunkKind::Text,
    })
}

/// `zTXt`: `keyword \0 method data`.
fn decode_compressed_text(payload: &[u8], limit: usize) -> Result<TextChunk, ChunkError> {
    let (keyword, rest) = split_keyword(payload)?;
    let (&method, data) = rest.split_first().ok_or(ChunkError::MalformedHeader)?;
    if method != 0 {
        return Err(ChunkError::UnsupportedCompression(method));
    }
    Ok(TextChunk {
        keyword,
        text: inflate(data, limit)?,
        kind: TextChunkKind::CompressedText,
    })
}

/// `iTXt`: `keyword \0 flag method language \0 translated \0 text`.
fn decode_international_text(payload: &[u8], limit: usize) -> Result<TextChunk, ChunkError> {
    let (keyword, rest) = split_keyword(payload)?;
    let [flag, method, tail @ ..] = rest else {
        return Err(ChunkError::MalformedHeader);
    };
    let after_language = skip_past_nul(tail)?;
    let text_bytes = skip_past_nul(after_language)?;

    let text = if *flag != 0 {
        if *method != 0 {
            return Err(ChunkError::UnsupportedCompression(*method));
        }
        inflate(text_bytes, limit)?
    } else {
        String::from_utf8_lossy(text_bytes).into_owned()
    };

    Ok(TextChunk {
        keyword,
        text,
        kind: TextChunkKind::InternationalText,
    })
}

fn skip_past_nul(bytes: &[u8]) -> Result<&[u8], ChunkError> {
    bytes
        .iter()
        .position(|&b| b == 0)
        .map(|nul| &bytes[nul + 1..])
        .ok_or(ChunkError::MalformedHeader)
}

/// Inflate a zlib stream, refusing output larger than `limit` bytes.
fn inflate(data: &[u8], limit: usize) -> Result<String, ChunkError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut out)
        .map_err(|e| ChunkError::DecompressionFailure(e.to_string()))?;
    if out.len() > limit {
        return Err(ChunkError::DecompressionFailure(format!(
            "inflated output exceeds {} bytes",
            limit
        )));
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
