// Chunk matching.
//
// Each new-file chunk is looked up by weak checksum among the basis chunks,
// then confirmed by strong hash. Candidates are tried in basis order and the
// first strong match wins. A matched chunk becomes a copy of that basis
// chunk, an unmatched one a literal of the new file's bytes. Copies whose
// basis ranges are byte-contiguous are merged into one run.
//
// Only chunk-aligned content is found: a region present in both files but
// cut at different boundaries is emitted as literals.

use std::collections::HashMap;

use crate::chunk::Chunk;
use crate::error::Result;

use super::DeltaSink;

// ---------------------------------------------------------------------------
// Candidate index
// ---------------------------------------------------------------------------

/// Basis chunks grouped by weak checksum, each group in basis order.
pub struct WeakIndex<'b> {
    basis: &'b [Chunk],
    by_weak: HashMap<u64, Vec<usize>>,
}

impl<'b> WeakIndex<'b> {
    pub fn new(basis: &'b [Chunk]) -> Self {
        let mut by_weak: HashMap<u64, Vec<usize>> = HashMap::with_capacity(basis.len());
        for (i, c) in basis.iter().enumerate() {
            by_weak.entry(c.weak_checksum).or_default().push(i);
        }
        Self { basis, by_weak }
    }

    /// Basis chunks sharing `weak_checksum`, in basis order.
    pub fn candidates(&self, weak_checksum: u64) -> impl Iterator<Item = &'b Chunk> + '_ {
        let basis = self.basis;
        self.by_weak
            .get(&weak_checksum)
            .into_iter()
            .flatten()
            .map(move |&i| &basis[i])
    }

    /// First candidate whose content is identical to `chunk`.
    pub fn find(&self, chunk: &Chunk) -> Option<&'b Chunk> {
        self.candidates(chunk.weak_checksum)
            .find(|c| c.strong_hash == chunk.strong_hash)
    }
}

// ---------------------------------------------------------------------------
// Copy run coalescing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CopyRun {
    start: u64,
    length: u64,
}

/// Merges adjacent copies before forwarding them to the inner sink.
///
/// A copy extends the open run only if it starts where the run ends in the
/// basis; a literal or a non-contiguous copy closes the run first. Call
/// [`Coalescer::finish`] to flush the last run.
pub struct Coalescer<S: DeltaSink> {
    sink: S,
    run: Option<CopyRun>,
}

impl<S: DeltaSink> Coalescer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, run: None }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(run) = self.run.take() {
            self.sink.add_copy(run.start, run.length)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.sink)
    }
}

impl<S: DeltaSink> DeltaSink for Coalescer<S> {
    fn add_literal(&mut self, data: &[u8]) -> Result<()> {
        self.flush()?;
        self.sink.add_literal(data)
    }

    fn add_copy(&mut self, start: u64, length: u64) -> Result<()> {
        if let Some(run) = &mut self.run {
            if run.start + run.length == start {
                run.length += length;
                return Ok(());
            }
        }
        self.flush()?;
        self.run = Some(CopyRun { start, length });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Per-chunk outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched_chunks: usize,
    pub literal_chunks: usize,
}

/// Classify every chunk of the new file and feed the coalesced result to `sink`.
///
/// `new_chunks` must have been resolved over `new_data`. Output order is
/// exactly the new chunk order.
pub fn match_chunks<S: DeltaSink>(
    basis: &[Chunk],
    new_chunks: &[Chunk],
    new_data: &[u8],
    sink: S,
) -> Result<MatchSummary> {
    let index = WeakIndex::new(basis);
    let mut out = Coalescer::new(sink);
    let mut summary = MatchSummary::default();

    for nc in new_chunks {
        match index.find(nc) {
            Some(c) => {
                log::trace!("{} matches chunk in basis file: {}", nc.ordinal, c.ordinal);
                summary.matched_chunks += 1;
                out.add_copy(c.start as u64, c.size as u64)?;
            }
            None => {
                log::trace!(
                    "{} has no matching chunk in basis file ({} bytes)",
                    nc.ordinal,
                    nc.size
                );
                summary.literal_chunks += 1;
                out.add_literal(&new_data[nc.range()])?;
            }
        }
    }

    out.finish()?;
    log::debug!(
        "matched {} of {} chunks against {} basis chunks",
        summary.matched_chunks,
        new_chunks.len(),
        basis.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{CommandRecorder, DeltaCommand};
    use crate::hash::StrongHash;

    fn chunk(start: u32, size: u32, weak: u64, content: &[u8], ordinal: usize) -> Chunk {
        Chunk {
            start,
            size,
            weak_checksum: weak,
            strong_hash: StrongHash::of(content),
            ordinal,
        }
    }

    #[test]
    fn coalescer_merges_contiguous_copies() {
        let mut rec = CommandRecorder::new();
        let mut c = Coalescer::new(&mut rec);
        c.add_copy(0, 10).unwrap();
        c.add_copy(10, 5).unwrap();
        c.add_copy(40, 5).unwrap();
        c.add_literal(b"xy").unwrap();
        c.add_copy(45, 5).unwrap();
        c.finish().unwrap();
        assert_eq!(
            rec.commands,
            vec![
                DeltaCommand::Copy { start: 0, length: 15 },
                DeltaCommand::Copy { start: 40, length: 5 },
                DeltaCommand::Literal(b"xy".to_vec()),
                DeltaCommand::Copy { start: 45, length: 5 },
            ]
        );
    }

    #[test]
    fn coalescer_does_not_merge_backwards() {
        let mut rec = CommandRecorder::new();
        let mut c = Coalescer::new(&mut rec);
        c.add_copy(10, 10).unwrap();
        c.add_copy(0, 10).unwrap();
        c.finish().unwrap();
        assert_eq!(rec.commands.len(), 2);
    }

    #[test]
    fn weak_collision_is_rejected_by_strong_hash() {
        let basis = vec![chunk(0, 4, 7, b"AAAA", 0)];
        let new = vec![chunk(0, 4, 7, b"BBBB", 0)];
        let mut rec = CommandRecorder::new();
        let summary = match_chunks(&basis, &new, b"BBBB", &mut rec).unwrap();
        assert_eq!(summary.literal_chunks, 1);
        assert_eq!(rec.commands, vec![DeltaCommand::Literal(b"BBBB".to_vec())]);
    }

    #[test]
    fn first_strong_match_in_basis_order_wins() {
        // Same content at two basis positions.
        let basis = vec![
            chunk(0, 4, 7, b"SAME", 0),
            chunk(4, 4, 9, b"OTHR", 1),
            chunk(8, 4, 7, b"SAME", 2),
        ];
        let index = WeakIndex::new(&basis);
        let probe = chunk(0, 4, 7, b"SAME", 0);
        assert_eq!(index.candidates(7).count(), 2);
        assert_eq!(index.find(&probe).map(|c| c.ordinal), Some(0));
        assert_eq!(index.candidates(1234).count(), 0);
    }

    #[test]
    fn empty_inputs() {
        let mut rec = CommandRecorder::new();
        let summary = match_chunks(&[], &[], &[], &mut rec).unwrap();
        assert_eq!(summary, MatchSummary::default());
        assert!(rec.commands.is_empty());
    }
}
