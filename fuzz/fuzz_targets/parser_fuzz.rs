#![no_main]
use libfuzzer_sys::fuzz_target;

const SUBCOMMANDS: [&str; 5] = ["signature", "delta", "patch", "inspect", "config"];

fuzz_target!(|data: &[u8]| {
    let Some((&pick, rest)) = data.split_first() else {
        return;
    };

    // Lead with a real subcommand so the fuzzer reaches argument validation.
    let mut args = vec![SUBCOMMANDS[usize::from(pick) % SUBCOMMANDS.len()].to_string()];
    args.extend(
        String::from_utf8_lossy(rest)
            .split_whitespace()
            .take(16)
            .map(str::to_string),
    );
    datadiff::cli::fuzz_try_parse_args(&args);
});
