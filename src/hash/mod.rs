// Weak (rolling) and strong (per-chunk) hashing.

pub mod rolling;
pub mod strong;

pub use rolling::{PolynomialHash, RollingHash, RollingSample, WeakHasher};
pub use strong::StrongHash;
