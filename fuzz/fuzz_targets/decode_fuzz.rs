#![no_main]
use libfuzzer_sys::fuzz_target;
use datadiff::{delta, signature};

fuzz_target!(|data: &[u8]| {
    // Both decoders must reject malformed input with an error, never a panic.
    let _ = signature::decode_signature(data);
    let _ = delta::parse_delta(data);

    // Apply against a basis taken from the front of the input.
    if data.len() >= 2 {
        let split = data.len() / 2;
        let (basis, delta_bytes) = data.split_at(split);
        let _ = delta::apply_delta(basis, delta_bytes);
    }
});
