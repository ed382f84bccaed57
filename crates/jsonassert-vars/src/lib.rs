//! Shared variables for jsonassert.
//!
//! A placeholder string in an expected document (e.g. `"$id"`) matches any
//! actual value the first time it is seen; the value is captured and every
//! later occurrence must equal it. The capture table outlives a single
//! comparison, so values can flow from one assertion to the next.
//!
//! - [`VarStore`] -- trait implemented by capture tables
//! - [`Vars`] -- in-memory table with a configurable placeholder prefix

pub mod memory;
pub mod traits;

pub use memory::{Vars, DEFAULT_PREFIX};
pub use traits::VarStore;
