//! Error types for the diff crate.

use jsonassert_types::{JsonValue, Position, ValueKind};

/// Root-level outcomes that make a tree diff meaningless.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The two roots are different kinds (e.g. array vs object).
    #[error("types mismatch, {expected} expected, got {actual}")]
    RootTypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// Both roots are the same scalar kind but unequal.
    #[error("values {expected} and {actual} are not equal")]
    RootValueMismatch {
        expected: JsonValue,
        actual: JsonValue,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// A delta tree that does not fit the value it is applied to.
///
/// Deltas are built from the very values they are applied to, so any of these
/// means the delta tree is internally inconsistent.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DeltaError {
    /// The delta's position has the wrong kind for its container.
    #[error("{delta} delta at {position} cannot address a member of {container}")]
    PositionKind {
        delta: &'static str,
        position: Position,
        container: ValueKind,
    },

    /// Array slot outside the current array.
    #[error("{delta} delta at index {index} is out of range for array of length {len}")]
    IndexOutOfRange {
        delta: &'static str,
        index: usize,
        len: usize,
    },

    /// Object member the delta refers to does not exist.
    #[error("{delta} delta refers to missing member {name:?}")]
    MissingMember { delta: &'static str, name: String },

    /// Nested delta applied to a value of the wrong kind.
    #[error("{delta} delta expects {expected}, found {actual}")]
    ContainerMismatch {
        delta: &'static str,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// The delta cannot replace a single value in place.
    #[error("{delta} delta cannot be applied in place")]
    NotInPlace { delta: &'static str },

    /// Text patch target is not a string.
    #[error("text delta requires a string value, found {found}")]
    MissingText { found: ValueKind },

    /// Text patch does not line up with the current text.
    #[error("text patch failed at char {offset}: {reason}")]
    PatchFailed { offset: usize, reason: &'static str },
}

/// Convenience alias for delta application results.
pub type DeltaResult<T> = Result<T, DeltaError>;
