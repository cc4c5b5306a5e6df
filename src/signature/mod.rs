// Signature: the chunk list describing a basis file.

pub mod codec;

use crate::chunk::Chunk;
use crate::error::Result;

pub use codec::{decode_signature, encode_signature, read_signature, write_signature};

/// Chunks of one basis file in increasing `start` order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    chunks: Vec<Chunk>,
}

impl Signature {
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        decode_signature(data).map(Self::from_chunks)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_signature(&self.chunks)
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Length of the basis file this signature describes.
    pub fn basis_len(&self) -> u64 {
        self.chunks.last().map_or(0, Chunk::end)
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}
