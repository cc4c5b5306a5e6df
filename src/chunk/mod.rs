// Content-defined chunking.
//
// A chunk list covers its file end-to-end: the first chunk starts at 0,
// each chunk starts where the previous one ended and the last one ends at
// the file length. Chunks are never mutated after the resolver (or the
// signature decoder) creates them.

pub mod config;
pub mod pipeline;
pub mod resolver;

use std::ops::Range;

use crate::hash::StrongHash;

pub use config::ChunkerConfig;
pub use pipeline::resolve_chunks_pipelined;
pub use resolver::resolve_chunks;

/// One content-addressed segment of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset within the source file.
    pub start: u32,
    /// Length in bytes.
    pub size: u32,
    /// Rolling-hash value observed at the boundary that closed this chunk.
    pub weak_checksum: u64,
    /// SHA-1 of the chunk's bytes.
    pub strong_hash: StrongHash,
    /// Position in the originating chunk list. Not persisted.
    pub ordinal: usize,
}

impl Chunk {
    /// Build a chunk over `data[range]`, computing its strong hash.
    pub fn from_range(data: &[u8], range: Range<usize>, weak_checksum: u64, ordinal: usize) -> Self {
        Self {
            start: range.start as u32,
            size: range.len() as u32,
            weak_checksum,
            strong_hash: StrongHash::of(&data[range]),
            ordinal,
        }
    }

    /// One past the chunk's last byte.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start as u64 + self.size as u64
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.start as usize + self.size as usize
    }
}

/// Check the coverage invariant: contiguous, starting at 0, ending at `len`.
pub fn covers(chunks: &[Chunk], len: u64) -> bool {
    let mut expected = 0u64;
    for c in chunks {
        if c.start as u64 != expected || c.size == 0 {
            return false;
        }
        expected = c.end();
    }
    expected == len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_range_and_end() {
        let data = b"0123456789";
        let c = Chunk::from_range(data, 3..7, 42, 1);
        assert_eq!(c.start, 3);
        assert_eq!(c.size, 4);
        assert_eq!(c.end(), 7);
        assert_eq!(&data[c.range()], b"3456");
        assert_eq!(c.strong_hash, StrongHash::of(b"3456"));
    }

    #[test]
    fn coverage_detects_gaps() {
        let data = [0u8; 10];
        let a = Chunk::from_range(&data, 0..4, 0, 0);
        let b = Chunk::from_range(&data, 4..10, 0, 1);
        let gap = Chunk::from_range(&data, 5..10, 0, 1);
        assert!(covers(&[a.clone(), b], 10));
        assert!(!covers(&[a, gap], 10));
        assert!(covers(&[], 0));
    }
}
