// Strong per-chunk digest (SHA-1).
//
// A weak checksum only shortlists candidates; two chunks are the same content
// only when their strong hashes are equal.

use sha1::{Digest, Sha1};

/// Digest length in bytes.
pub const STRONG_HASH_LEN: usize = 20;

/// SHA-1 digest of a chunk's exact byte range.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrongHash(pub [u8; STRONG_HASH_LEN]);

impl StrongHash {
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut out = [0u8; STRONG_HASH_LEN];
        out.copy_from_slice(&digest);
        Self(out)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; STRONG_HASH_LEN] {
        &self.0
    }
}

impl From<[u8; STRONG_HASH_LEN]> for StrongHash {
    fn from(bytes: [u8; STRONG_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for StrongHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for StrongHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StrongHash({self})")
    }
}
