//! Rendering for jsonassert diffs.
//!
//! - [`AsciiFormatter`] -- prints the expected document with `+` / `-` marked lines
//! - [`reduce_diff`] -- keeps only the lines around each change in long output

pub mod ascii;
pub mod error;
pub mod options;
pub mod reduce;

pub use ascii::AsciiFormatter;
pub use error::{FormatError, FormatResult};
pub use options::FormatOptions;
pub use reduce::{reduce_diff, OMITTED};
