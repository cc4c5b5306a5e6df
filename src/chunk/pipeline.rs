// Pipelined chunk resolver.
//
// The rolling hash runs on a scoped producer thread and streams samples to
// the boundary/strong-hash consumer over a bounded channel. Samples are sent
// in batches to keep channel traffic low; within and across batches they
// arrive in ascending offset order, so the output is identical to the
// sequential resolver's.

use std::sync::mpsc;
use std::thread;

use crate::error::Result;
use crate::hash::rolling::{RollingSample, WeakHasher};

use super::Chunk;
use super::config::ChunkerConfig;
use super::resolver::{ChunkBuilder, check_addressable, resolve_chunks};

/// Samples per channel message.
const SAMPLE_BATCH: usize = 4096;

/// Default number of in-flight batches.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Split `data` into chunks, hashing on a separate thread.
///
/// `capacity` bounds the number of sample batches buffered between the two
/// sides; a capacity of 0 makes every send a rendezvous.
pub fn resolve_chunks_pipelined<H: WeakHasher + ?Sized>(
    data: &[u8],
    config: &ChunkerConfig,
    hasher: &H,
    capacity: usize,
) -> Result<Vec<Chunk>> {
    check_addressable(data.len())?;
    if data.len() < hasher.window() {
        return resolve_chunks(data, config, hasher);
    }

    let samples = hasher.samples(data)?;

    let chunks = thread::scope(|s| {
        let (tx, rx) = mpsc::sync_channel::<Vec<RollingSample>>(capacity);

        s.spawn(move || {
            let mut samples = samples;
            loop {
                let batch: Vec<RollingSample> = samples.by_ref().take(SAMPLE_BATCH).collect();
                if batch.is_empty() {
                    break;
                }
                // The receiver only hangs up once it has everything it needs.
                if tx.send(batch).is_err() {
                    break;
                }
            }
        });

        let mut builder = ChunkBuilder::new(data, *config);
        for batch in rx {
            for sample in batch {
                builder.push(sample);
            }
        }
        builder.finish()
    });

    Ok(chunks)
}
