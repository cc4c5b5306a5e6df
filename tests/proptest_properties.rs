use std::collections::HashSet;

use datadiff::chunk::{self, ChunkerConfig};
use datadiff::delta::{CommandRecorder, DeltaCommand, parse_delta};
use datadiff::engine::{self, DiffOptions};
use datadiff::hash::PolynomialHash;
use datadiff::signature::{decode_signature, encode_signature};
use proptest::prelude::*;

fn chunk(data: &[u8]) -> Vec<datadiff::chunk::Chunk> {
    chunk::resolve_chunks(data, &ChunkerConfig::default(), &PolynomialHash::default()).unwrap()
}

/// Low-entropy bytes so content boundaries actually fire.
fn text_like() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![Just(b' '), Just(b'\n'), b'a'..=b'z', any::<u8>()],
        0..6000,
    )
}

proptest! {
    #[test]
    fn prop_chunks_tile_input(data in text_like()) {
        let chunks = chunk(&data);
        let mut expected_start = 0u64;
        for (i, c) in chunks.iter().enumerate() {
            prop_assert_eq!(c.start as u64, expected_start);
            prop_assert!(c.size >= 1);
            prop_assert!(c.size <= 1024);
            if i + 1 < chunks.len() {
                prop_assert!(c.size >= 32, "inner chunk {} has size {}", i, c.size);
            }
            expected_start = c.end();
        }
        prop_assert_eq!(expected_start, data.len() as u64);
        prop_assert_eq!(chunks.is_empty(), data.is_empty());
    }

    #[test]
    fn prop_chunking_is_deterministic(data in text_like()) {
        prop_assert_eq!(chunk(&data), chunk(&data));
    }

    #[test]
    fn prop_pipelined_matches_sequential(data in text_like(), capacity in 0usize..4) {
        let config = ChunkerConfig::default();
        let hasher = PolynomialHash::default();
        let seq = chunk::resolve_chunks(&data, &config, &hasher).unwrap();
        let par = chunk::resolve_chunks_pipelined(&data, &config, &hasher, capacity).unwrap();
        prop_assert_eq!(seq, par);
    }

    #[test]
    fn prop_signature_decodes_to_same_chunks(data in text_like()) {
        let chunks = chunk(&data);
        let encoded = encode_signature(&chunks).unwrap();
        prop_assert_eq!(encoded.len(), 4 + 36 * chunks.len());
        prop_assert_eq!(decode_signature(&encoded).unwrap(), chunks);
    }

    #[test]
    fn prop_patch_reconstructs_new_file(basis in text_like(), new in text_like()) {
        let opts = DiffOptions::default();
        let sig = engine::signature(&basis, &opts).unwrap();
        let delta = engine::delta(&sig, &new, &opts).unwrap();
        prop_assert_eq!(engine::patch(&basis, &delta).unwrap(), new);
    }

    #[test]
    fn prop_edited_file_reconstructs(
        basis in text_like(),
        at in any::<prop::sample::Index>(),
        insert in proptest::collection::vec(any::<u8>(), 0..64),
        remove in 0usize..64,
    ) {
        let mut new = basis.clone();
        let pos = if basis.is_empty() { 0 } else { at.index(basis.len()) };
        let end = (pos + remove).min(new.len());
        new.splice(pos..end, insert);

        let opts = DiffOptions::default();
        let sig = engine::signature(&basis, &opts).unwrap();
        let delta = engine::delta(&sig, &new, &opts).unwrap();
        prop_assert_eq!(engine::patch(&basis, &delta).unwrap(), new);
    }

    #[test]
    fn prop_commands_alternate_or_are_disjoint_copies(basis in text_like(), new in text_like()) {
        let opts = DiffOptions::default();
        let sig = engine::signature(&basis, &opts).unwrap();
        let commands = parse_delta(&engine::delta(&sig, &new, &opts).unwrap()).unwrap();
        for pair in commands.windows(2) {
            if let [
                DeltaCommand::Copy { start: a, length: l },
                DeltaCommand::Copy { start: b, .. },
            ] = pair
            {
                prop_assert_ne!(a + l, *b, "adjacent copies were not coalesced");
            }
        }
    }

    #[test]
    fn prop_identical_file_is_one_copy(basis in proptest::collection::vec(any::<u8>(), 1..8192)) {
        let chunks = chunk(&basis);
        let distinct: HashSet<_> = chunks.iter().map(|c| c.strong_hash).collect();
        prop_assume!(distinct.len() == chunks.len());

        let opts = DiffOptions::default();
        let sig = engine::signature(&basis, &opts).unwrap();
        let mut rec = CommandRecorder::new();
        engine::delta_into(&sig, &basis, &opts, &PolynomialHash::default(), &mut rec).unwrap();
        prop_assert_eq!(
            rec.commands,
            vec![DeltaCommand::Copy { start: 0, length: basis.len() as u64 }]
        );
    }
}
