// Signature wire format (big-endian, no padding):
//
//   u32 chunk_count
//   chunk_count x { u32 start, u32 size, u64 weak_checksum, [u8; 20] strong_hash }

use std::io::{self, Read, Write};

use crate::chunk::Chunk;
use crate::error::{Error, Field, FormatError, Result};
use crate::hash::StrongHash;
use crate::hash::strong::STRONG_HASH_LEN;

/// Encoded size of one chunk record.
pub const RECORD_LEN: usize = 4 + 4 + 8 + STRONG_HASH_LEN;

/// Encoded size of the header.
pub const HEADER_LEN: usize = 4;

/// Upper bound on the capacity reserved up front from an untrusted count.
const MAX_PREALLOC: usize = 1 << 16;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Write `chunks` in signature format.
pub fn write_signature<W: Write>(w: &mut W, chunks: &[Chunk]) -> Result<()> {
    let count = u32::try_from(chunks.len()).map_err(|_| Error::InputTooLarge { len: chunks.len() })?;
    w.write_all(&count.to_be_bytes())?;

    let mut record = [0u8; RECORD_LEN];
    for c in chunks {
        record[0..4].copy_from_slice(&c.start.to_be_bytes());
        record[4..8].copy_from_slice(&c.size.to_be_bytes());
        record[8..16].copy_from_slice(&c.weak_checksum.to_be_bytes());
        record[16..].copy_from_slice(c.strong_hash.as_bytes());
        w.write_all(&record)?;
    }
    Ok(())
}

/// Encode `chunks` into a fresh buffer.
pub fn encode_signature(chunks: &[Chunk]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + chunks.len() * RECORD_LEN);
    write_signature(&mut out, chunks)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read a signature from `r`. Bytes after the last record are not consumed.
///
/// A stream that ends early fails with [`FormatError::Truncated`] naming the
/// field and chunk index being read. Ordinals are reconstructed from record
/// position.
pub fn read_signature<R: Read>(r: &mut R) -> Result<Vec<Chunk>> {
    let count = read_array::<_, 4>(r, Field::ChunkCount, None)?;
    let count = u32::from_be_bytes(count) as usize;

    let mut chunks = Vec::with_capacity(count.min(MAX_PREALLOC));
    for i in 0..count {
        let start = u32::from_be_bytes(read_array(r, Field::ChunkStart, Some(i))?);
        let size = u32::from_be_bytes(read_array(r, Field::ChunkSize, Some(i))?);
        let weak_checksum = u64::from_be_bytes(read_array(r, Field::ChunkWeakChecksum, Some(i))?);
        let strong: [u8; STRONG_HASH_LEN] = read_array(r, Field::ChunkStrongHash, Some(i))?;

        chunks.push(Chunk {
            start,
            size,
            weak_checksum,
            strong_hash: StrongHash(strong),
            ordinal: i,
        });
    }
    Ok(chunks)
}

/// Decode a signature held in memory.
pub fn decode_signature(mut data: &[u8]) -> Result<Vec<Chunk>> {
    let chunks = read_signature(&mut data)?;
    if !data.is_empty() {
        log::warn!("ignoring {} trailing bytes after signature", data.len());
    }
    Ok(chunks)
}

fn read_array<R: Read, const N: usize>(
    r: &mut R,
    field: Field,
    index: Option<usize>,
) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    match r.read_exact(&mut buf) {
        Ok(()) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(FormatError::Truncated { field, index }.into())
        }
        Err(e) => Err(Error::Io(e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
