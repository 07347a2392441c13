//! PNG ancillary text chunk reading.
//!
//! Character cards ride inside PNG images as `tEXt`, `zTXt` or `iTXt`
//! metadata. Only those chunks are decoded; image data is skipped by offset
//! arithmetic and never inspected.

pub mod chunk_reader;

#[cfg(test)]
pub(crate) mod testing;

pub use chunk_reader::{
    read_text_chunks, ChunkError, ChunkReader, TextChunk, TextChunkKind, DEFAULT_INFLATE_LIMIT,
    PNG_SIGNATURE,
};
