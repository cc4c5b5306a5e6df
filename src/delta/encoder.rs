// Delta stream writer.
//
// Writes the magic on construction, one record per command, and the
// terminator on `finish()`. It does no merging of its own; the matcher hands
// it already-coalesced copies.

use std::io::Write;

use crate::error::Result;

use super::{DELTA_MAGIC, DeltaCommand, DeltaSink, OP_COPY_N8_N8, OP_END, OP_LITERAL_N8};

/// Counters collected while writing a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaStats {
    pub copy_commands: u64,
    pub literal_commands: u64,
    pub copied_bytes: u64,
    pub literal_bytes: u64,
    /// Encoded delta size including magic and terminator.
    pub delta_size: u64,
}

/// Encodes commands into the rdiff-compatible delta format.
pub struct RdiffDeltaWriter<W: Write> {
    writer: W,
    stats: DeltaStats,
}

impl<W: Write> RdiffDeltaWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(&DELTA_MAGIC)?;
        Ok(Self {
            writer,
            stats: DeltaStats {
                delta_size: DELTA_MAGIC.len() as u64,
                ..Default::default()
            },
        })
    }

    pub fn stats(&self) -> &DeltaStats {
        &self.stats
    }

    /// Write the terminator and hand back the writer.
    pub fn finish(mut self) -> Result<(W, DeltaStats)> {
        self.writer.write_all(&[OP_END])?;
        self.stats.delta_size += 1;
        Ok((self.writer, self.stats))
    }
}

impl<W: Write> DeltaSink for RdiffDeltaWriter<W> {
    fn add_literal(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        self.writer.write_all(&[OP_LITERAL_N8])?;
        self.writer.write_all(&len.to_be_bytes())?;
        self.writer.write_all(data)?;

        self.stats.literal_commands += 1;
        self.stats.literal_bytes += len;
        self.stats.delta_size += 1 + 8 + len;
        Ok(())
    }

    fn add_copy(&mut self, start: u64, length: u64) -> Result<()> {
        let mut rec = [0u8; 17];
        rec[0] = OP_COPY_N8_N8;
        rec[1..9].copy_from_slice(&start.to_be_bytes());
        rec[9..17].copy_from_slice(&length.to_be_bytes());
        self.writer.write_all(&rec)?;

        self.stats.copy_commands += 1;
        self.stats.copied_bytes += length;
        self.stats.delta_size += rec.len() as u64;
        Ok(())
    }
}

/// Encode a command list verbatim (no coalescing).
pub fn encode_commands(commands: &[DeltaCommand]) -> Result<Vec<u8>> {
    let mut w = RdiffDeltaWriter::new(Vec::new())?;
    for cmd in commands {
        match cmd {
            DeltaCommand::Literal(data) => w.add_literal(data)?,
            DeltaCommand::Copy { start, length } => w.add_copy(*start, *length)?,
        }
    }
    let (out, _) = w.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_delta_is_magic_and_terminator() {
        let bytes = encode_commands(&[]).unwrap();
        assert_eq!(bytes, b"rs\x026\x00");
    }

    #[test]
    fn literal_and_copy_layout() {
        let bytes = encode_commands(&[
            DeltaCommand::Literal(b"hi".to_vec()),
            DeltaCommand::Copy {
                start: 0x0102,
                length: 0x0304,
            },
        ])
        .unwrap();

        let mut expected = b"rs\x026".to_vec();
        expected.push(0x44);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 2]);
        expected.extend_from_slice(b"hi");
        expected.push(0x54);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x03, 0x04]);
        expected.push(0x00);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn stats_track_bytes() {
        let mut w = RdiffDeltaWriter::new(Vec::new()).unwrap();
        w.add_literal(b"abc").unwrap();
        w.add_copy(10, 100).unwrap();
        w.add_copy(500, 20).unwrap();
        let (out, stats) = w.finish().unwrap();
        assert_eq!(stats.literal_commands, 1);
        assert_eq!(stats.copy_commands, 2);
        assert_eq!(stats.literal_bytes, 3);
        assert_eq!(stats.copied_bytes, 120);
        assert_eq!(stats.delta_size, out.len() as u64);
    }
}
