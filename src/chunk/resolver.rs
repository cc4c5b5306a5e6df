// Sequential chunk resolver.
//
// Consumes the rolling-hash stream in offset order and closes a chunk
// whenever the boundary predicate holds. Whatever is left after the last
// sample becomes one final (possibly short) chunk carrying the last observed
// checksum. Inputs shorter than the hash window produce no samples and are
// emitted whole with a zero checksum.

use crate::error::{Error, Result};
use crate::hash::rolling::{RollingSample, WeakHasher};

use super::Chunk;
use super::config::ChunkerConfig;

/// Split `data` into content-defined chunks.
pub fn resolve_chunks<H: WeakHasher + ?Sized>(
    data: &[u8],
    config: &ChunkerConfig,
    hasher: &H,
) -> Result<Vec<Chunk>> {
    check_addressable(data.len())?;

    let mut builder = ChunkBuilder::new(data, *config);
    if data.len() >= hasher.window() {
        for sample in hasher.samples(data)? {
            builder.push(sample);
        }
    }
    Ok(builder.finish())
}

/// Offsets and sizes are stored as u32.
pub(crate) fn check_addressable(len: usize) -> Result<()> {
    if len as u64 > u32::MAX as u64 {
        return Err(Error::InputTooLarge { len });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Boundary state machine
// ---------------------------------------------------------------------------

/// Shared by the sequential and pipelined resolvers.
pub(crate) struct ChunkBuilder<'d> {
    data: &'d [u8],
    config: ChunkerConfig,
    /// First byte of the open chunk.
    start: usize,
    last_hash: u64,
    chunks: Vec<Chunk>,
}

impl<'d> ChunkBuilder<'d> {
    pub(crate) fn new(data: &'d [u8], config: ChunkerConfig) -> Self {
        Self {
            data,
            config,
            start: 0,
            last_hash: 0,
            chunks: Vec::with_capacity(data.len() / 256 + 1),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, sample: RollingSample) {
        if sample.offset >= self.data.len() {
            return;
        }
        let Some(distance) = sample.offset.checked_sub(self.start) else {
            return;
        };
        self.last_hash = sample.value;
        if self.config.is_boundary(distance, sample.value) {
            self.close(sample.offset + 1, sample.value);
        }
    }

    fn close(&mut self, end: usize, weak_checksum: u64) {
        let chunk = Chunk::from_range(self.data, self.start..end, weak_checksum, self.chunks.len());
        log::trace!(
            "chunk {}: start={} size={} weak={} strong={}",
            chunk.ordinal,
            chunk.start,
            chunk.size,
            chunk.weak_checksum,
            chunk.strong_hash
        );
        self.chunks.push(chunk);
        self.start = end;
    }

    pub(crate) fn finish(mut self) -> Vec<Chunk> {
        if self.start < self.data.len() {
            self.close(self.data.len(), self.last_hash);
        }
        log::debug!(
            "resolved {} chunks over {} bytes",
            self.chunks.len(),
            self.data.len()
        );
        self.chunks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
