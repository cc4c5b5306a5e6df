// Rolling polynomial checksum used to place content-defined chunk boundaries.
//
// The checksum of a W-byte window is the window read as a base-256 number
// modulo a fixed prime. Sliding by one byte removes the outgoing byte's
// weighted contribution, shifts by the base and folds in the incoming byte,
// so each step is O(1) and the whole pass is O(n).
//
// The resulting values are part of the signature wire format (they are stored
// as each chunk's weak checksum), so the arithmetic must not change.

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Width of the rolling window in bytes.
pub const WINDOW_SIZE: usize = 16;

/// Prime modulus of the polynomial checksum.
pub const MODULUS: u64 = 1_000_000_009;

/// Polynomial base (one digit per byte).
const BASE: u64 = 256;

/// Weight of the oldest byte in a `window`-byte window: `256^(window-1) mod p`.
pub const fn shift_multiplier(window: usize) -> u64 {
    let mut m = 1u64;
    let mut i = 1;
    while i < window {
        m = m * BASE % MODULUS;
        i += 1;
    }
    m
}

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One rolling-hash observation: the checksum of the window ending at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingSample {
    /// Index of the window's last byte.
    pub offset: usize,
    /// Checksum of `data[offset + 1 - W ..= offset]`.
    pub value: u64,
}

/// Boxed sample stream handed out by a [`WeakHasher`].
pub type Samples<'a> = Box<dyn Iterator<Item = RollingSample> + Send + 'a>;

/// Source of weak checksums for the chunker.
///
/// The chunker only depends on this trait, so tests can substitute a
/// hasher that produces a scripted sample stream.
pub trait WeakHasher: Sync {
    /// Number of bytes covered by each sample. No samples exist for inputs
    /// shorter than this.
    fn window(&self) -> usize;

    /// Produce one sample per window position, offsets strictly ascending
    /// from `window() - 1` to `data.len() - 1`.
    ///
    /// Fails with [`Error::Precondition`] if `data` is shorter than the window.
    fn samples<'a>(&self, data: &'a [u8]) -> Result<Samples<'a>>;
}

// ---------------------------------------------------------------------------
// Polynomial hash
// ---------------------------------------------------------------------------

/// The wire-compatible weak hasher (`W = 16`, `p = 1_000_000_009`, base 256).
#[derive(Debug, Clone, Copy)]
pub struct PolynomialHash {
    window: usize,
}

impl PolynomialHash {
    /// Hasher with a custom window width. Checksums produced with any width
    /// other than [`WINDOW_SIZE`] are not compatible with stored signatures.
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }
}

impl Default for PolynomialHash {
    fn default() -> Self {
        Self {
            window: WINDOW_SIZE,
        }
    }
}

impl WeakHasher for PolynomialHash {
    fn window(&self) -> usize {
        self.window
    }

    fn samples<'a>(&self, data: &'a [u8]) -> Result<Samples<'a>> {
        Ok(Box::new(RollingHash::with_window(data, self.window)?))
    }
}

/// Lazy iterator over the rolling checksum of `data`.
///
/// Finite and not restartable; build a new one to rescan.
#[derive(Debug, Clone)]
pub struct RollingHash<'a> {
    data: &'a [u8],
    window: usize,
    shift: u64,
    hash: u64,
    /// Offset of the next sample to emit.
    pos: usize,
}

impl<'a> RollingHash<'a> {
    /// Rolling hash over `data` with the standard 16-byte window.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Self::with_window(data, WINDOW_SIZE)
    }

    pub fn with_window(data: &'a [u8], window: usize) -> Result<Self> {
        let window = window.max(1);
        if data.len() < window {
            return Err(Error::Precondition {
                len: data.len(),
                window,
            });
        }

        let hash = data[..window]
            .iter()
            .fold(0u64, |h, &b| (h * BASE + b as u64) % MODULUS);

        Ok(Self {
            data,
            window,
            shift: shift_multiplier(window),
            hash,
            pos: window - 1,
        })
    }

    /// Slide the window one byte: drop `outgoing`, append `incoming`.
    #[inline(always)]
    fn roll(&mut self, outgoing: u8, incoming: u8) {
        let weighted = outgoing as u64 * self.shift % MODULUS;
        self.hash = ((self.hash + MODULUS - weighted) * BASE + incoming as u64) % MODULUS;
    }
}

impl Iterator for RollingHash<'_> {
    type Item = RollingSample;

    #[inline]
    fn next(&mut self) -> Option<RollingSample> {
        let i = self.pos;
        if i >= self.data.len() {
            return None;
        }
        if i >= self.window {
            self.roll(self.data[i - self.window], self.data[i]);
        }
        self.pos += 1;
        Some(RollingSample {
            offset: i,
            value: self.hash,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.data.len().saturating_sub(self.pos);
        (n, Some(n))
    }
}

impl ExactSizeIterator for RollingHash<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
