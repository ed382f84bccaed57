//! JSON equality assertions for tests.
//!
//! Compares an expected JSON document with an actual one and, when they
//! differ, returns a failure message showing the expected document with the
//! offending lines marked `-` (expected) and `+` (actual).
//!
//! The expected document can relax the comparison:
//!
//! - the string `"<ignore-diff>"` matches any actual value
//! - with a [`VarStore`] attached, placeholders such as `"$id"` capture the
//!   actual value on first sight and must match it afterwards
//! - the subset entry points (`fail_mismatch*`) accept extra members and
//!   elements in the actual document
//!
//! ```
//! use jsonassert::{fail_mismatch, fail_not_equal};
//!
//! assert!(fail_not_equal(br#"{"id": "<ignore-diff>", "n": 1}"#, br#"{"id": 7, "n": 1}"#).is_ok());
//! assert!(fail_mismatch(br#"{"n": 1}"#, br#"{"n": 1, "extra": true}"#).is_ok());
//!
//! let err = fail_not_equal(br#"{"n": 1}"#, br#"{"n": 2}"#).unwrap_err();
//! assert_eq!(err.to_string(), "not equal:\n {\n-  \"n\": 1\n+  \"n\": 2\n }\n");
//! ```

pub mod comparer;
pub mod config;
pub mod error;
pub mod filter;

pub use comparer::{
    fail_mismatch, fail_mismatch_marshal, fail_not_equal, fail_not_equal_marshal, Comparer,
};
pub use config::{CompareOptions, ConfigError, ConfigResult, IGNORE_DIFF};
pub use error::{CompareError, CompareResult};
pub use filter::DeltaFilter;

// Re-export the types callers need to build values and variable stores
pub use jsonassert_diff::DiffOptions;
pub use jsonassert_format::FormatOptions;
pub use jsonassert_types::{JsonNumber, JsonValue};
pub use jsonassert_vars::{VarStore, Vars};
