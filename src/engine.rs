// Top-level operations: signature, delta and patch.
//
// Every function here is a pure transformation of in-memory byte buffers;
// file handling lives in `io` and argument handling in `cli`.
//
//   signature: basis -> rolling hash -> chunks -> signature bytes
//   delta:     signature bytes -> basis chunks
//              new file -> rolling hash -> chunks
//              (basis chunks, new chunks, new file) -> matcher -> delta bytes
//   patch:     (basis, delta bytes) -> new file

use crate::chunk::pipeline::DEFAULT_CHANNEL_CAPACITY;
use crate::chunk::{self, Chunk, ChunkerConfig};
use crate::delta::{self, DeltaSink, DeltaStats, MatchSummary, RdiffDeltaWriter};
use crate::error::Result;
use crate::hash::{PolynomialHash, WeakHasher};
use crate::signature;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings threaded through every operation.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Boundary rule. Must match between signature and delta runs.
    pub chunker: ChunkerConfig,
    /// Run the rolling hash on a producer thread.
    pub pipelined: bool,
    /// Sample batches buffered between producer and consumer.
    pub channel_capacity: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            pipelined: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// What a delta run found and wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaReport {
    pub basis_chunks: usize,
    pub new_chunks: usize,
    pub matches: MatchSummary,
    pub stats: DeltaStats,
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Chunk `data` with the standard rolling hash.
pub fn chunk(data: &[u8], opts: &DiffOptions) -> Result<Vec<Chunk>> {
    chunk_with(data, opts, &PolynomialHash::default())
}

/// Chunk `data` with a caller-supplied weak hasher.
pub fn chunk_with<H: WeakHasher + ?Sized>(
    data: &[u8],
    opts: &DiffOptions,
    hasher: &H,
) -> Result<Vec<Chunk>> {
    if opts.pipelined {
        chunk::resolve_chunks_pipelined(data, &opts.chunker, hasher, opts.channel_capacity)
    } else {
        chunk::resolve_chunks(data, &opts.chunker, hasher)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Build the signature of a basis file.
pub fn signature(basis: &[u8], opts: &DiffOptions) -> Result<Vec<u8>> {
    let chunks = chunk(basis, opts)?;
    signature::encode_signature(&chunks)
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Build the delta that turns the signature's basis into `new_file`.
pub fn delta(signature: &[u8], new_file: &[u8], opts: &DiffOptions) -> Result<Vec<u8>> {
    delta_with_report(signature, new_file, opts).map(|(bytes, _)| bytes)
}

/// Like [`delta`], also returning match and encoding counters.
pub fn delta_with_report(
    signature: &[u8],
    new_file: &[u8],
    opts: &DiffOptions,
) -> Result<(Vec<u8>, DeltaReport)> {
    let basis = signature::decode_signature(signature)?;
    let new_chunks = chunk(new_file, opts)?;

    let mut writer = RdiffDeltaWriter::new(Vec::with_capacity(new_file.len() / 8 + 16))?;
    let matches = delta::match_chunks(&basis, &new_chunks, new_file, &mut writer)?;
    let (bytes, stats) = writer.finish()?;

    log::debug!(
        "delta: {} copies ({} bytes), {} literals ({} bytes), {} bytes encoded",
        stats.copy_commands,
        stats.copied_bytes,
        stats.literal_commands,
        stats.literal_bytes,
        stats.delta_size
    );

    let report = DeltaReport {
        basis_chunks: basis.len(),
        new_chunks: new_chunks.len(),
        matches,
        stats,
    };
    Ok((bytes, report))
}

/// Match `new_file` against `signature`, feeding coalesced commands to `sink`.
///
/// The weak hasher must be the one the signature was built with.
pub fn delta_into<H, S>(
    signature: &[u8],
    new_file: &[u8],
    opts: &DiffOptions,
    hasher: &H,
    sink: S,
) -> Result<MatchSummary>
where
    H: WeakHasher + ?Sized,
    S: DeltaSink,
{
    let basis = signature::decode_signature(signature)?;
    let new_chunks = chunk_with(new_file, opts, hasher)?;
    delta::match_chunks(&basis, &new_chunks, new_file, sink)
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Reconstruct the new file from its basis and a delta.
pub fn patch(basis: &[u8], delta: &[u8]) -> Result<Vec<u8>> {
    delta::apply_delta(basis, delta)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
