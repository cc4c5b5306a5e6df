// Command-line front end for datadiff.
//
// Subcommands map one-to-one onto the file helpers in `io`:
//
//   datadiff signature BASIS SIGNATURE
//   datadiff delta SIGNATURE NEWFILE DELTA
//   datadiff patch BASIS DELTA OUTPUT
//   datadiff inspect FILE [--kind auto|signature|delta]
//   datadiff config
//
// Exit codes: 0 success, 2 argument or file precondition, 3 processing
// failure, 4 output write failure.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::chunk::ChunkerConfig;
use crate::delta::{DELTA_MAGIC, DeltaCommand, DeltaReader};
use crate::engine::DiffOptions;
use crate::hash::rolling::{MODULUS, WINDOW_SIZE};
use crate::hash::strong::STRONG_HASH_LEN;
use crate::io::{self, FileOptions, IoError, Role};
use crate::signature::Signature;
use crate::signature::codec::{HEADER_LEN, RECORD_LEN};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Content-defined chunking signatures and deltas.
#[derive(Parser, Debug)]
#[command(
    name = "datadiff",
    version,
    about = "Signature, delta and patch tool based on content-defined chunking",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (only errors are logged).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (-v for debug, -vv for per-chunk trace).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,

    /// Compute the rolling hash on a separate thread.
    #[arg(long, global = true)]
    pipelined: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Write the signature of a basis file.
    Signature(SignatureArgs),
    /// Write the delta from a signature's basis to a new file.
    Delta(DeltaArgs),
    /// Rebuild a new file from its basis and a delta.
    Patch(PatchArgs),
    /// Print the contents of a signature or delta file.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct SignatureArgs {
    /// Basis file to describe.
    #[arg(value_hint = ValueHint::FilePath)]
    basis: PathBuf,

    /// Signature file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    signature: PathBuf,
}

#[derive(Args, Debug)]
struct DeltaArgs {
    /// Signature of the basis file.
    #[arg(value_hint = ValueHint::FilePath)]
    signature: PathBuf,

    /// New file to encode.
    #[arg(value_hint = ValueHint::FilePath)]
    new_file: PathBuf,

    /// Delta file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,
}

#[derive(Args, Debug)]
struct PatchArgs {
    /// Basis file the delta was computed against.
    #[arg(value_hint = ValueHint::FilePath)]
    basis: PathBuf,

    /// Delta file to apply.
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,

    /// Reconstructed file to write.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Detect from the delta magic.
    Auto,
    Signature,
    Delta,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// File to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// How to interpret the file.
    #[arg(long, value_enum, default_value_t = KindArg::Auto)]
    kind: KindArg,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Signature {
        basis: PathBuf,
        signature: PathBuf,
    },
    Delta {
        signature: PathBuf,
        new_file: PathBuf,
        delta: PathBuf,
    },
    Patch {
        basis: PathBuf,
        delta: PathBuf,
        output: PathBuf,
    },
    Inspect {
        file: PathBuf,
        kind: KindArg,
    },
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    pipelined: bool,
}

impl Options {
    fn file_options(&self) -> FileOptions {
        FileOptions {
            force: self.force,
            diff: DiffOptions {
                pipelined: self.pipelined,
                ..DiffOptions::default()
            },
        }
    }

    fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    fn chatty(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }
}

fn resolve_options(cli: Cli) -> Options {
    let command = match cli.command {
        Cmd::Signature(args) => Command::Signature {
            basis: args.basis,
            signature: args.signature,
        },
        Cmd::Delta(args) => Command::Delta {
            signature: args.signature,
            new_file: args.new_file,
            delta: args.delta,
        },
        Cmd::Patch(args) => Command::Patch {
            basis: args.basis,
            delta: args.delta,
            output: args.output,
        },
        Cmd::Inspect(args) => Command::Inspect {
            file: args.file,
            kind: args.kind,
        },
        Cmd::Config => Command::Config,
    };

    Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        pipelined: cli.pipelined,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("datadiff".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Reporting helpers
// ---------------------------------------------------------------------------

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn digest_json(digest: Option<[u8; 32]>) -> serde_json::Value {
    digest.map_or(serde_json::Value::Null, |d| hex(&d).into())
}

fn emit_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => log::error!("cannot serialize stats: {e}"),
    }
}

fn fail(err: &IoError) -> i32 {
    eprintln!("datadiff: {err}");
    err.exit_code()
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    let chunker = ChunkerConfig::default();
    let file_io = cfg!(feature = "file-io") as u8;

    eprintln!("datadiff version {version}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("WINDOW_SIZE={WINDOW_SIZE}");
    eprintln!("MODULUS={MODULUS}");
    eprintln!("SEPARATOR_MASK={:#x}", chunker.separator_mask);
    eprintln!("MIN_CHUNK_SIZE={}", chunker.min_chunk_size);
    eprintln!("MAX_CHUNK_SIZE={}", chunker.max_chunk_size);
    eprintln!("STRONG_HASH_LEN={STRONG_HASH_LEN}");
    eprintln!("SIGNATURE_RECORD_LEN={RECORD_LEN}");
    eprintln!("DELTA_MAGIC={}", hex(&DELTA_MAGIC));

    0
}

// ---------------------------------------------------------------------------
// Signature command
// ---------------------------------------------------------------------------

fn cmd_signature(opts: &Options, basis: &Path, signature: &Path) -> i32 {
    let stats = match io::signature_file(basis, signature, &opts.file_options()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if opts.chatty() {
        eprintln!(
            "datadiff: signature: basis size: {}, chunks: {}, signature size: {}",
            stats.basis_size, stats.chunks, stats.signature_size
        );
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "signature",
            "basis_size": stats.basis_size,
            "chunks": stats.chunks,
            "signature_size": stats.signature_size,
            "basis_sha256": digest_json(stats.basis_sha256),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Delta command
// ---------------------------------------------------------------------------

fn cmd_delta(opts: &Options, signature: &Path, new_file: &Path, delta: &Path) -> i32 {
    let stats = match io::delta_file(signature, new_file, delta, &opts.file_options()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let report = &stats.report;

    if opts.chatty() {
        eprintln!(
            "datadiff: delta: basis chunks: {}, new chunks: {}, matched: {}, \
             copies: {} ({} bytes), literals: {} ({} bytes), delta size: {}",
            report.basis_chunks,
            report.new_chunks,
            report.matches.matched_chunks,
            report.stats.copy_commands,
            report.stats.copied_bytes,
            report.stats.literal_commands,
            report.stats.literal_bytes,
            stats.delta_size
        );
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "delta",
            "signature_size": stats.signature_size,
            "new_size": stats.new_size,
            "delta_size": stats.delta_size,
            "basis_chunks": report.basis_chunks,
            "new_chunks": report.new_chunks,
            "matched_chunks": report.matches.matched_chunks,
            "literal_chunks": report.matches.literal_chunks,
            "copy_commands": report.stats.copy_commands,
            "literal_commands": report.stats.literal_commands,
            "copied_bytes": report.stats.copied_bytes,
            "literal_bytes": report.stats.literal_bytes,
            "new_sha256": digest_json(stats.new_sha256),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Patch command
// ---------------------------------------------------------------------------

fn cmd_patch(opts: &Options, basis: &Path, delta: &Path, output: &Path) -> i32 {
    let stats = match io::patch_file(basis, delta, output, &opts.file_options()) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if opts.chatty() {
        eprintln!(
            "datadiff: patch: basis size: {}, delta size: {}, output size: {}",
            stats.basis_size, stats.delta_size, stats.output_size
        );
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "patch",
            "basis_size": stats.basis_size,
            "delta_size": stats.delta_size,
            "output_size": stats.output_size,
            "output_sha256": digest_json(stats.output_sha256),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn detect_kind(data: &[u8], kind: KindArg) -> KindArg {
    match kind {
        KindArg::Auto if data.starts_with(&DELTA_MAGIC) => KindArg::Delta,
        KindArg::Auto => KindArg::Signature,
        k => k,
    }
}

fn print_signature(data: &[u8]) -> Result<serde_json::Value, crate::Error> {
    let sig = Signature::decode(data)?;
    println!("signature: {} chunks, basis size {}", sig.len(), sig.basis_len());
    println!("{:>6} {:>10} {:>6} {:>12}  strong", "#", "start", "size", "weak");
    for (i, c) in sig.chunks().iter().enumerate() {
        println!(
            "{i:>6} {:>10} {:>6} {:>12}  {}",
            c.start, c.size, c.weak_checksum, c.strong_hash
        );
    }
    Ok(serde_json::json!({
        "command": "inspect",
        "kind": "signature",
        "chunks": sig.len(),
        "basis_size": sig.basis_len(),
        "size": data.len(),
        "expected_size": HEADER_LEN + sig.len() * RECORD_LEN,
    }))
}

fn print_delta(data: &[u8]) -> Result<serde_json::Value, crate::Error> {
    let mut copies = 0u64;
    let mut literals = 0u64;
    let mut output_size = 0u64;
    println!("delta: {} bytes", data.len());
    for (i, cmd) in DeltaReader::new(data)?.enumerate() {
        let cmd = cmd?;
        output_size += cmd.output_len();
        match cmd {
            DeltaCommand::Copy { start, length } => {
                copies += 1;
                println!("{i:>6}  COPY    start {start} length {length}");
            }
            DeltaCommand::Literal(bytes) => {
                literals += 1;
                println!("{i:>6}  LITERAL length {}", bytes.len());
            }
        }
    }
    Ok(serde_json::json!({
        "command": "inspect",
        "kind": "delta",
        "size": data.len(),
        "copy_commands": copies,
        "literal_commands": literals,
        "output_size": output_size,
    }))
}

fn cmd_inspect(opts: &Options, file: &Path, kind: KindArg) -> i32 {
    let role = match kind {
        KindArg::Delta => Role::Delta,
        _ => Role::Signature,
    };
    let data = match io::read_input(role, file) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let (role, result) = match detect_kind(&data, kind) {
        KindArg::Delta => (Role::Delta, print_delta(&data)),
        _ => (Role::Signature, print_signature(&data)),
    };

    match result {
        Ok(json) => {
            if opts.json_output {
                emit_json(&json);
            }
            0
        }
        Err(source) => fail(&IoError::Process { role, source }),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(opts.log_filter()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &opts.command {
        Command::Signature { basis, signature } => cmd_signature(&opts, basis, signature),
        Command::Delta {
            signature,
            new_file,
            delta,
        } => cmd_delta(&opts, signature, new_file, delta),
        Command::Patch {
            basis,
            delta,
            output,
        } => cmd_patch(&opts, basis, delta, output),
        Command::Inspect { file, kind } => cmd_inspect(&opts, file, *kind),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
