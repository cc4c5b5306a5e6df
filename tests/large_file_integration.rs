use datadiff::engine::DiffOptions;
use datadiff::io::{FileOptions, delta_file, patch_file, signature_file};
use tempfile::tempdir;

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    (0..size)
        .map(|_| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
            (s >> 33) as u8
        })
        .collect()
}

fn roundtrip(size: usize, pipelined: bool) {
    let dir = tempdir().unwrap();
    let basis_path = dir.path().join("basis.bin");
    let new_path = dir.path().join("new.bin");
    let sig_path = dir.path().join("basis.sig");
    let delta_path = dir.path().join("new.delta");
    let out_path = dir.path().join("out.bin");

    let basis = gen_data(size, 42);
    let mut new = basis.clone();
    new[64 * 1024..64 * 1024 + 14].copy_from_slice(b"mutated-block!");
    new.splice(size / 2..size / 2, b"middle-insert".iter().copied());
    new.truncate(new.len() - 4096);
    std::fs::write(&basis_path, &basis).unwrap();
    std::fs::write(&new_path, &new).unwrap();

    let opts = FileOptions {
        force: false,
        diff: DiffOptions {
            pipelined,
            ..Default::default()
        },
    };

    let sig = signature_file(&basis_path, &sig_path, &opts).unwrap();
    assert_eq!(sig.basis_size, size as u64);
    assert!(sig.chunks as usize >= size / 1024);

    let d = delta_file(&sig_path, &new_path, &delta_path, &opts).unwrap();
    assert!(
        d.report.stats.literal_bytes < 8 * 1024,
        "literal bytes {}",
        d.report.stats.literal_bytes
    );
    assert!(d.delta_size < (new.len() / 50) as u64);

    let p = patch_file(&basis_path, &delta_path, &out_path, &opts).unwrap();
    assert_eq!(p.output_size, new.len() as u64);
    assert_eq!(std::fs::read(&out_path).unwrap(), new);
}

#[test]
fn multi_mib_file_roundtrip() {
    roundtrip(4 * 1024 * 1024, false);
}

#[test]
fn multi_mib_file_roundtrip_pipelined() {
    roundtrip(4 * 1024 * 1024, true);
}

#[test]
#[ignore = "large test is opt-in due runtime and disk requirements"]
fn quarter_gb_file_roundtrip() {
    roundtrip(256 * 1024 * 1024, true);
}
