//! Value model for jsonassert.
//!
//! This crate provides the decoded JSON representation every other jsonassert
//! crate works on. Numbers keep their decoded representation so that large
//! integers survive comparison and capture without precision loss.
//!
//! # Key Types
//!
//! - [`JsonValue`] -- closed tagged union over the JSON value kinds, objects in sorted key order
//! - [`JsonNumber`] -- signed, unsigned and floating point numbers with exact equality
//! - [`ValueKind`] -- the kind of a value, used in mismatch reports
//! - [`Position`] -- object member name or array index addressing a delta

pub mod error;
pub mod number;
pub mod position;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use number::JsonNumber;
pub use position::Position;
pub use value::{quote, JsonValue, ValueKind};
