//! Builders for synthetic PNG buffers used across the test suites.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::PNG_SIGNATURE;

/// A raw chunk with a zeroed CRC.
pub(crate) fn chunk(chunk_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 12);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(payload);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}

/// Signature followed by `chunks`, with no `IEND`.
pub(crate) fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub(crate) fn text(keyword: &str, text: &str) -> Vec<u8> {
    let mut payload = keyword.as_bytes().to_vec();
    payload.push(0);
    payload.extend_from_slice(text.as_bytes());
    chunk(b"tEXt", &payload)
}

pub(crate) fn ztxt(keyword: &str, text: &str) -> Vec<u8> {
    let mut payload = keyword.as_bytes().to_vec();
    payload.extend_from_slice(&[0, 0]);
    payload.extend(zlib(text.as_bytes()));
    chunk(b"zTXt", &payload)
}

pub(crate) fn itxt(keyword: &str, text: &str, compressed: bool) -> Vec<u8> {
    let mut payload = keyword.as_bytes().to_vec();
    payload.push(0);
    payload.push(u8::from(compressed));
    payload.push(0);
    payload.extend_from_slice(b"en\0");
    payload.extend_from_slice(keyword.as_bytes());
    payload.push(0);
    if compressed {
        payload.extend(zlib(text.as_bytes()));
    } else {
        payload.extend_from_slice(text.as_bytes());
    }
    chunk(b"iTXt", &payload)
}
