//! Diff engine for jsonassert.
//!
//! Compares two decoded JSON documents and produces a tree of deltas
//! describing how the expected document turns into the actual one.
//!
//! # Key Types
//!
//! - [`Differ`] / [`DiffOptions`] -- Structural comparison with move detection for arrays
//! - [`Diff`] / [`Delta`] -- Delta tree; applying it to the expected root yields the actual root
//! - [`EditScript`] / [`TextOp`] -- Character-level patch carried by text deltas

pub mod delta;
pub mod differ;
pub mod error;
pub mod similarity;
pub mod text;

pub use delta::{apply_deltas, Delta, Diff, SimilarityCache};
pub use differ::{diff, DiffOptions, Differ};
pub use error::{DeltaError, DeltaResult, DiffError, DiffResult};
pub use text::{EditScript, TextOp};
