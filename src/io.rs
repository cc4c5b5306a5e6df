// File-level helpers around the pure engine.
//
// Provides `signature_file()`, `delta_file()` and `patch_file()`. Inputs are
// read fully into memory; the output is written only after the whole
// operation succeeded, so a failure never leaves a partial file behind.
// Output targets are checked up front and refused if they exist unless
// `force` is set. Optionally computes SHA-256 checksums of the files
// involved (feature-gated behind `file-io`).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::{self, DeltaReport, DiffOptions};
use crate::signature::codec::{HEADER_LEN, RECORD_LEN};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which argument a file plays, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Basis,
    Signature,
    NewFile,
    Delta,
    Output,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Basis => "BASIS",
            Self::Signature => "SIGNATURE",
            Self::NewFile => "NEWFILE",
            Self::Delta => "DELTA",
            Self::Output => "OUTPUT",
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("{role} file does not exist: {}", .path.display())]
    NotFound { role: Role, path: PathBuf },

    #[error("{role} is a directory: {}", .path.display())]
    IsDirectory { role: Role, path: PathBuf },

    #[error("{role} file already exists: {}", .path.display())]
    AlreadyExists { role: Role, path: PathBuf },

    #[error("cannot open {role} file {}: {source}", .path.display())]
    Open {
        role: Role,
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to read {role} file: {source}")]
    Read { role: Role, source: io::Error },

    #[error("failed to process {role} file: {source}")]
    Process { role: Role, source: crate::Error },

    #[error("failed to write {role} file: {source}")]
    Write { role: Role, source: io::Error },
}

impl IoError {
    /// Process exit code for this failure: 2 for argument/file
    /// preconditions, 3 for processing failures, 4 for output failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. }
            | Self::IsDirectory { .. }
            | Self::AlreadyExists { .. }
            | Self::Open { .. } => 2,
            Self::Read { .. } | Self::Process { .. } => 3,
            Self::Write { .. } => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Byte source / sink
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Read a whole input file, reporting a missing file or a directory distinctly.
pub fn read_input(role: Role, path: &Path) -> Result<Vec<u8>, IoError> {
    let meta = fs::metadata(path).map_err(|source| open_error(role, path, source))?;
    if meta.is_dir() {
        return Err(IoError::IsDirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| IoError::Read { role, source })
}

/// Refuse an existing output target unless `force` is set.
pub fn check_output(role: Role, path: &Path, force: bool) -> Result<(), IoError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(IoError::IsDirectory {
            role,
            path: path.to_path_buf(),
        }),
        Ok(_) if !force => Err(IoError::AlreadyExists {
            role,
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(open_error(role, path, source)),
    }
}

/// Write `data` to `path`, replacing any existing file.
pub fn write_output(role: Role, path: &Path, data: &[u8]) -> Result<(), IoError> {
    let write = || -> io::Result<()> {
        let mut w = BufWriter::with_capacity(BUF_SIZE, File::create(path)?);
        w.write_all(data)?;
        w.flush()
    };
    write().map_err(|source| IoError::Write { role, source })
}

fn open_error(role: Role, path: &Path, source: io::Error) -> IoError {
    if source.kind() == io::ErrorKind::NotFound {
        IoError::NotFound {
            role,
            path: path.to_path_buf(),
        }
    } else {
        IoError::Open {
            role,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    use sha2::Digest;
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// Options and stats
// ---------------------------------------------------------------------------

/// Options for the file-level helpers.
#[derive(Debug, Clone, Default)]
pub struct FileOptions {
    /// Overwrite existing output files.
    pub force: bool,
    pub diff: DiffOptions,
}

/// Statistics returned by `signature_file()`.
#[derive(Debug, Clone)]
pub struct SignatureStats {
    pub basis_size: u64,
    pub signature_size: u64,
    pub chunks: u64,
    /// SHA-256 of the basis file (if `file-io` feature is enabled).
    pub basis_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `delta_file()`.
#[derive(Debug, Clone)]
pub struct DeltaFileStats {
    pub signature_size: u64,
    pub new_size: u64,
    pub delta_size: u64,
    pub report: DeltaReport,
    /// SHA-256 of the new file (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    pub basis_size: u64,
    pub delta_size: u64,
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// signature_file
// ---------------------------------------------------------------------------

/// Write the signature of `basis_path` to `signature_path`.
pub fn signature_file(
    basis_path: &Path,
    signature_path: &Path,
    opts: &FileOptions,
) -> Result<SignatureStats, IoError> {
    check_output(Role::Signature, signature_path, opts.force)?;
    let basis = read_input(Role::Basis, basis_path)?;

    let signature = engine::signature(&basis, &opts.diff).map_err(|source| IoError::Process {
        role: Role::Basis,
        source,
    })?;
    write_output(Role::Signature, signature_path, &signature)?;

    Ok(SignatureStats {
        basis_size: basis.len() as u64,
        signature_size: signature.len() as u64,
        chunks: ((signature.len() - HEADER_LEN) / RECORD_LEN) as u64,
        basis_sha256: sha256(&basis),
    })
}

// ---------------------------------------------------------------------------
// delta_file
// ---------------------------------------------------------------------------

/// Write the delta from the signature's basis to `new_path` into `delta_path`.
pub fn delta_file(
    signature_path: &Path,
    new_path: &Path,
    delta_path: &Path,
    opts: &FileOptions,
) -> Result<DeltaFileStats, IoError> {
    check_output(Role::Delta, delta_path, opts.force)?;
    let signature = read_input(Role::Signature, signature_path)?;
    let new_data = read_input(Role::NewFile, new_path)?;

    let (delta, report) =
        engine::delta_with_report(&signature, &new_data, &opts.diff).map_err(|source| {
            let role = match source {
                crate::Error::Format(_) => Role::Signature,
                _ => Role::NewFile,
            };
            IoError::Process { role, source }
        })?;
    write_output(Role::Delta, delta_path, &delta)?;

    Ok(DeltaFileStats {
        signature_size: signature.len() as u64,
        new_size: new_data.len() as u64,
        delta_size: delta.len() as u64,
        report,
        new_sha256: sha256(&new_data),
    })
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply the delta at `delta_path` to `basis_path`, writing `output_path`.
pub fn patch_file(
    basis_path: &Path,
    delta_path: &Path,
    output_path: &Path,
    opts: &FileOptions,
) -> Result<PatchStats, IoError> {
    check_output(Role::Output, output_path, opts.force)?;
    let basis = read_input(Role::Basis, basis_path)?;
    let delta = read_input(Role::Delta, delta_path)?;

    let output = engine::patch(&basis, &delta).map_err(|source| IoError::Process {
        role: Role::Delta,
        source,
    })?;
    write_output(Role::Output, output_path, &output)?;

    Ok(PatchStats {
        basis_size: basis.len() as u64,
        delta_size: delta.len() as u64,
        output_size: output.len() as u64,
        output_sha256: sha256(&output),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_text(n: usize) -> Vec<u8> {
        (0..n)
            .map(|i| b"the quick brown fox jumps over the lazy dog\n"[(i * 31 + i / 97) % 44])
            .collect()
    }

    #[test]
    fn signature_delta_patch_roundtrip() {
        let dir = tempdir().unwrap();
        let basis_path = dir.path().join("basis.bin");
        let new_path = dir.path().join("new.bin");
        let sig_path = dir.path().join("basis.sig");
        let delta_path = dir.path().join("new.delta");
        let out_path = dir.path().join("out.bin");

        let basis = sample_text(10_000);
        let mut new = basis.clone();
        new[5000..5010].copy_from_slice(b"0123456789");
        fs::write(&basis_path, &basis).unwrap();
        fs::write(&new_path, &new).unwrap();

        let opts = FileOptions::default();
        let s = signature_file(&basis_path, &sig_path, &opts).unwrap();
        assert_eq!(s.basis_size, 10_000);
        assert_eq!(s.signature_size, fs::metadata(&sig_path).unwrap().len());
        assert_eq!(s.signature_size, HEADER_LEN as u64 + s.chunks * RECORD_LEN as u64);

        let d = delta_file(&sig_path, &new_path, &delta_path, &opts).unwrap();
        assert_eq!(d.new_size, new.len() as u64);
        assert_eq!(d.delta_size, fs::metadata(&delta_path).unwrap().len());

        let p = patch_file(&basis_path, &delta_path, &out_path, &opts).unwrap();
        assert_eq!(p.output_size, new.len() as u64);
        assert_eq!(fs::read(&out_path).unwrap(), new);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_checksums_computed() {
        let dir = tempdir().unwrap();
        let basis_path = dir.path().join("basis.bin");
        let new_path = dir.path().join("new.bin");
        let sig_path = dir.path().join("basis.sig");
        let delta_path = dir.path().join("new.delta");
        let out_path = dir.path().join("out.bin");
        fs::write(&basis_path, sample_text(3000)).unwrap();
        fs::write(&new_path, sample_text(2500)).unwrap();

        let opts = FileOptions::default();
        let s = signature_file(&basis_path, &sig_path, &opts).unwrap();
        assert!(s.basis_sha256.is_some());
        let d = delta_file(&sig_path, &new_path, &delta_path, &opts).unwrap();
        let p = patch_file(&basis_path, &delta_path, &out_path, &opts).unwrap();
        assert_eq!(p.output_sha256, d.new_sha256);
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_input(Role::Basis, &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IoError::NotFound { role: Role::Basis, .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("BASIS file does not exist"));
    }

    #[test]
    fn directory_input_is_reported() {
        let dir = tempdir().unwrap();
        let err = read_input(Role::Signature, dir.path()).unwrap_err();
        assert!(matches!(err, IoError::IsDirectory { role: Role::Signature, .. }));
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exists");
        fs::write(&path, b"keep me").unwrap();
        let err = check_output(Role::Delta, &path, false).unwrap_err();
        assert!(matches!(err, IoError::AlreadyExists { .. }));
        check_output(Role::Delta, &path, true).unwrap();
        check_output(Role::Delta, &dir.path().join("fresh"), false).unwrap();
    }

    #[test]
    fn failure_leaves_no_output() {
        let dir = tempdir().unwrap();
        let sig_path = dir.path().join("bad.sig");
        let new_path = dir.path().join("new.bin");
        let delta_path = dir.path().join("new.delta");
        fs::write(&sig_path, [0, 0, 0, 2, 0, 0]).unwrap();
        fs::write(&new_path, b"some new content").unwrap();

        let err = delta_file(&sig_path, &new_path, &delta_path, &FileOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Process { role: Role::Signature, .. }));
        assert_eq!(err.exit_code(), 3);
        assert!(!delta_path.exists());
    }
}
