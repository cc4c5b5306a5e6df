#![no_main]
use libfuzzer_sys::fuzz_target;
use datadiff::engine::{self, DiffOptions};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the split and the pipelined mode.
    let flags = data[0];
    let payload = &data[1..];
    let split = payload.len() * usize::from(flags & 0x7F) / 127;
    let (basis, new) = payload.split_at(split.min(payload.len()));

    let opts = DiffOptions {
        pipelined: flags & 0x80 != 0,
        ..Default::default()
    };
    let sig = engine::signature(basis, &opts).unwrap();
    let delta = engine::delta(&sig, new, &opts).unwrap();
    let out = engine::patch(basis, &delta).unwrap();
    assert_eq!(out, new);
});
