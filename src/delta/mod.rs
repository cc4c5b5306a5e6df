// Delta commands and the wire format shared by the encoder and decoder.
//
// Delta file layout:
//
//   [u8; 4] magic = "rs\x026"
//   commands:
//     LITERAL: u8 0x44, u64 length, [u8; length] data
//     COPY:    u8 0x54, u64 start, u64 length
//   u8 0x00 terminator
//
// All integers are big-endian.

pub mod decoder;
pub mod encoder;
pub mod matcher;

use crate::error::Result;

pub use decoder::{DeltaReader, apply_commands, apply_delta, parse_delta};
pub use encoder::{DeltaStats, RdiffDeltaWriter, encode_commands};
pub use matcher::{Coalescer, MatchSummary, WeakIndex, match_chunks};

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

pub const DELTA_MAGIC: [u8; 4] = *b"rs\x026";

/// End of command stream.
pub const OP_END: u8 = 0x00;

/// Literal with a u64 length.
pub const OP_LITERAL_N8: u8 = 0x44;

/// Copy with u64 start and u64 length.
pub const OP_COPY_N8_N8: u8 = 0x54;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One reconstruction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaCommand {
    /// Emit these bytes verbatim.
    Literal(Vec<u8>),
    /// Emit `length` bytes of the basis file starting at `start`.
    Copy { start: u64, length: u64 },
}

impl DeltaCommand {
    /// Number of output bytes this command produces.
    pub fn output_len(&self) -> u64 {
        match self {
            Self::Literal(data) => data.len() as u64,
            Self::Copy { length, .. } => *length,
        }
    }

    pub fn is_copy(&self) -> bool {
        matches!(self, Self::Copy { .. })
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Receiver of match results.
///
/// The matcher drives a sink through a [`Coalescer`], so sinks see copies
/// already merged into byte-contiguous runs.
pub trait DeltaSink {
    fn add_literal(&mut self, data: &[u8]) -> Result<()>;
    fn add_copy(&mut self, start: u64, length: u64) -> Result<()>;
}

impl<S: DeltaSink + ?Sized> DeltaSink for &mut S {
    fn add_literal(&mut self, data: &[u8]) -> Result<()> {
        (**self).add_literal(data)
    }

    fn add_copy(&mut self, start: u64, length: u64) -> Result<()> {
        (**self).add_copy(start, length)
    }
}

/// Sink that keeps the command list in memory.
#[derive(Debug, Default, Clone)]
pub struct CommandRecorder {
    pub commands: Vec<DeltaCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_commands(self) -> Vec<DeltaCommand> {
        self.commands
    }
}

impl DeltaSink for CommandRecorder {
    fn add_literal(&mut self, data: &[u8]) -> Result<()> {
        self.commands.push(DeltaCommand::Literal(data.to_vec()));
        Ok(())
    }

    fn add_copy(&mut self, start: u64, length: u64) -> Result<()> {
        self.commands.push(DeltaCommand::Copy { start, length });
        Ok(())
    }
}
