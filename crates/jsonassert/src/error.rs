use jsonassert_diff::DiffError;
use jsonassert_types::{JsonValue, ValueError, ValueKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to unmarshal expected:\n{0}")]
    DecodeExpected(#[source] ValueError),

    #[error("failed to unmarshal actual:\n{0}")]
    DecodeActual(#[source] ValueError),

    #[error("failed to marshal actual value: {0}")]
    Marshal(#[source] ValueError),

    #[error("types mismatch, {expected} expected, got {actual}")]
    RootTypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("values {expected} and {actual} are not equal")]
    RootValueMismatch {
        expected: JsonValue,
        actual: JsonValue,
    },

    /// The documents differ; `diff` is the rendered (possibly reduced) diff.
    #[error("not equal:\n{diff}")]
    NotEqual { diff: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// Returns `true` if the documents were decoded and found to differ.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            Self::RootTypeMismatch { .. } | Self::RootValueMismatch { .. } | Self::NotEqual { .. }
        )
    }
}

impl From<DiffError> for CompareError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::RootTypeMismatch { expected, actual } => {
                Self::RootTypeMismatch { expected, actual }
            }
            DiffError::RootValueMismatch { expected, actual } => {
                Self::RootValueMismatch { expected, actual }
            }
        }
    }
}

pub type CompareResult<T> = Result<T, CompareError>;
