//! Datadiff: content-defined chunking signatures and deltas in Rust.
//!
//! Given a *basis* file, [`engine::signature`] describes its content as a
//! list of content-defined chunks. Given that signature and a *new* file,
//! [`engine::delta`] produces copy/literal instructions that rebuild the new
//! file from the basis, and [`engine::patch`] applies them.
//!
//! The crate provides:
//! - Rolling and strong hashing (`hash`)
//! - Content-defined chunking (`chunk`)
//! - The signature wire format (`signature`)
//! - Chunk matching and the delta wire format (`delta`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use datadiff::engine::{self, DiffOptions};
//!
//! let basis = b"hello old world, hello old world, hello old world";
//! let new = b"hello new world, hello old world, hello old world";
//!
//! let opts = DiffOptions::default();
//! let sig = engine::signature(basis, &opts).unwrap();
//! let delta = engine::delta(&sig, new, &opts).unwrap();
//! assert_eq!(engine::patch(basis, &delta).unwrap(), new);
//! ```

pub mod chunk;
pub mod delta;
pub mod engine;
pub mod error;
pub mod hash;
pub mod io;
pub mod signature;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, FormatError, Result};
