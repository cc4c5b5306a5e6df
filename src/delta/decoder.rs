// Delta stream reader and patch application.
//
// The reader validates the magic, then yields one command per record until
// the terminator. A stream that ends before the terminator, an unknown
// opcode or bytes after the terminator are format errors.

use crate::error::{Error, Field, FormatError, Result};

use super::{DELTA_MAGIC, DeltaCommand, OP_COPY_N8_N8, OP_END, OP_LITERAL_N8};

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Iterator over the commands of an in-memory delta.
pub struct DeltaReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Index of the next command.
    index: usize,
    done: bool,
}

impl<'a> DeltaReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let Some(magic) = data.get(..DELTA_MAGIC.len()) else {
            return Err(FormatError::Truncated {
                field: Field::Magic,
                index: None,
            }
            .into());
        };
        if magic != DELTA_MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(FormatError::BadMagic { found }.into());
        }
        Ok(Self {
            data,
            pos: DELTA_MAGIC.len(),
            index: 0,
            done: false,
        })
    }

    fn take(&mut self, n: usize, field: Field) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(FormatError::truncated(field, self.index))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn take_u64(&mut self, field: Field) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, field)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_command(&mut self) -> Result<Option<DeltaCommand>> {
        let Some(&opcode) = self.data.get(self.pos) else {
            return Err(FormatError::MissingTerminator.into());
        };
        self.pos += 1;

        let cmd = match opcode {
            OP_END => {
                self.done = true;
                if self.pos != self.data.len() {
                    return Err(FormatError::TrailingData { offset: self.pos }.into());
                }
                return Ok(None);
            }
            OP_LITERAL_N8 => {
                let length = self.take_u64(Field::LiteralLength)?;
                let n = usize::try_from(length).map_err(|_| FormatError::LiteralTooLarge { length })?;
                DeltaCommand::Literal(self.take(n, Field::LiteralData)?.to_vec())
            }
            OP_COPY_N8_N8 => {
                let start = self.take_u64(Field::CopyStart)?;
                let length = self.take_u64(Field::CopyLength)?;
                DeltaCommand::Copy { start, length }
            }
            opcode => {
                return Err(FormatError::UnknownOpcode {
                    opcode,
                    index: self.index,
                }
                .into());
            }
        };
        self.index += 1;
        Ok(Some(cmd))
    }
}

impl Iterator for DeltaReader<'_> {
    type Item = Result<DeltaCommand>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_command() {
            Ok(Some(cmd)) => Some(Ok(cmd)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a whole delta into its command list.
pub fn parse_delta(delta: &[u8]) -> Result<Vec<DeltaCommand>> {
    DeltaReader::new(delta)?.collect()
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

fn copy_range(start: u64, length: u64, basis_len: usize) -> Result<std::ops::Range<usize>> {
    let out_of_range = || -> Error {
        FormatError::CopyOutOfRange {
            start,
            length,
            basis_len,
        }
        .into()
    };
    let end = start.checked_add(length).ok_or_else(out_of_range)?;
    if end > basis_len as u64 {
        return Err(out_of_range());
    }
    Ok(start as usize..end as usize)
}

/// Rebuild the new file from `basis` and an already-parsed command list.
pub fn apply_commands(basis: &[u8], commands: &[DeltaCommand]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(basis.len());
    for cmd in commands {
        match cmd {
            DeltaCommand::Literal(data) => out.extend_from_slice(data),
            DeltaCommand::Copy { start, length } => {
                out.extend_from_slice(&basis[copy_range(*start, *length, basis.len())?]);
            }
        }
    }
    Ok(out)
}

/// Rebuild the new file from `basis` and an encoded delta.
///
/// Nothing is returned unless the whole delta is valid.
pub fn apply_delta(basis: &[u8], delta: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(basis.len());
    for cmd in DeltaReader::new(delta)? {
        match cmd? {
            DeltaCommand::Literal(data) => out.extend_from_slice(&data),
            DeltaCommand::Copy { start, length } => {
                out.extend_from_slice(&basis[copy_range(start, length, basis.len())?]);
            }
        }
    }
    log::debug!("patched {} basis bytes into {} bytes", basis.len(), out.len());
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
