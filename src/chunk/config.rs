// Chunker profile.
//
// Boundaries are compared on the *distance* `i - start` between the current
// window end `i` and the open chunk's first byte, so a chunk closed by the
// separator predicate is at least `min_chunk_size + 1` bytes and a forced
// boundary produces exactly `max_chunk_size + 1` bytes.

/// Low bits a weak checksum must have all set to end a chunk.
pub const SEPARATOR_MASK: u64 = 0x7F;

/// Minimum distance before a content boundary is accepted.
pub const MIN_CHUNK_SIZE: usize = 31;

/// Distance at which a boundary is forced regardless of content.
pub const MAX_CHUNK_SIZE: usize = 1023;

/// Boundary rule parameters.
///
/// Changing any field yields signatures that do not interoperate with
/// signatures built from [`ChunkerConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub separator_mask: u64,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            separator_mask: SEPARATOR_MASK,
            min_chunk_size: MIN_CHUNK_SIZE,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl ChunkerConfig {
    /// Does a sample with weak checksum `hash`, `distance` bytes past the
    /// open chunk's start, close that chunk?
    #[inline(always)]
    pub fn is_boundary(&self, distance: usize, hash: u64) -> bool {
        let separator = (hash & self.separator_mask) == self.separator_mask;
        (separator && distance >= self.min_chunk_size) || distance == self.max_chunk_size
    }

    /// Largest chunk this profile can produce.
    pub fn largest_chunk(&self) -> usize {
        self.max_chunk_size + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_needs_minimum_distance() {
        let cfg = ChunkerConfig::default();
        assert!(!cfg.is_boundary(30, 0x7F));
        assert!(cfg.is_boundary(31, 0x7F));
        assert!(cfg.is_boundary(500, 0xFFFF_FF7F));
        assert!(!cfg.is_boundary(500, 0x7E));
    }

    #[test]
    fn max_distance_forces_boundary() {
        let cfg = ChunkerConfig::default();
        assert!(cfg.is_boundary(1023, 0));
        assert!(!cfg.is_boundary(1022, 0));
        assert_eq!(cfg.largest_chunk(), 1024);
    }
}
