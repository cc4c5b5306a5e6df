// Error types shared by the chunking, signature and delta layers.
//
// Matching never fails: an unmatched chunk is a literal, not an error.
// Everything else is returned to the caller as a typed result; nothing is
// retried or recovered internally.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or truncated signature/delta stream.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Input is shorter than the rolling-hash window.
    #[error("rolling hash needs at least {window} bytes of input, got {len}")]
    Precondition { len: usize, window: usize },

    /// Chunk offsets are 32-bit on the wire.
    #[error("input of {len} bytes exceeds the 4 GiB addressable by a signature")]
    InputTooLarge { len: usize },

    /// Surfaced verbatim from a byte source or sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Wire format errors
// ---------------------------------------------------------------------------

/// Which field of a signature or delta record was being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ChunkCount,
    ChunkStart,
    ChunkSize,
    ChunkWeakChecksum,
    ChunkStrongHash,
    Magic,
    Opcode,
    LiteralLength,
    LiteralData,
    CopyStart,
    CopyLength,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ChunkCount => "total number of chunks",
            Self::ChunkStart => "chunk start",
            Self::ChunkSize => "chunk size",
            Self::ChunkWeakChecksum => "chunk weak checksum",
            Self::ChunkStrongHash => "chunk strong hash",
            Self::Magic => "delta magic",
            Self::Opcode => "command opcode",
            Self::LiteralLength => "literal length",
            Self::LiteralData => "literal data",
            Self::CopyStart => "copy start",
            Self::CopyLength => "copy length",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Stream ended before `field` of record `index` was fully read.
    /// `index` is `None` for header fields.
    #[error("failed to read {}{field}: unexpected end of stream", index_prefix(.index))]
    Truncated { field: Field, index: Option<usize> },

    #[error("bad delta magic {found:02x?}")]
    BadMagic { found: [u8; 4] },

    #[error("unknown delta opcode {opcode:#04x} at command {index}")]
    UnknownOpcode { opcode: u8, index: usize },

    #[error("delta stream has no terminator")]
    MissingTerminator,

    #[error("trailing data after delta terminator at offset {offset}")]
    TrailingData { offset: usize },

    #[error("copy of {length} bytes at {start} exceeds basis of {basis_len} bytes")]
    CopyOutOfRange {
        start: u64,
        length: u64,
        basis_len: usize,
    },

    #[error("literal of {length} bytes does not fit in memory")]
    LiteralTooLarge { length: u64 },
}

fn index_prefix(index: &Option<usize>) -> String {
    index.map(|i| format!("[{i}] ")).unwrap_or_default()
}

impl FormatError {
    pub(crate) fn truncated(field: Field, index: usize) -> Self {
        Self::Truncated {
            field,
            index: Some(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_message_names_field_and_index() {
        let e = FormatError::truncated(Field::ChunkSize, 3);
        assert_eq!(
            e.to_string(),
            "failed to read [3] chunk size: unexpected end of stream"
        );

        let e = FormatError::Truncated {
            field: Field::ChunkCount,
            index: None,
        };
        assert_eq!(
            e.to_string(),
            "failed to read total number of chunks: unexpected end of stream"
        );
    }

    #[test]
    fn format_error_converts_into_error() {
        let e: Error = FormatError::MissingTerminator.into();
        assert!(matches!(e, Error::Format(FormatError::MissingTerminator)));
    }
}
