use jsonassert_diff::DeltaError;
use jsonassert_types::{Position, ValueKind};

/// Errors from rendering a delta tree against its expected document.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Only object and array roots can be rendered.
    #[error("expected an object or array root, got {0}")]
    UnsupportedRoot(ValueKind),

    /// A nested delta addresses a value of a different kind.
    #[error("{delta} delta at {position} does not fit a {found} value")]
    TypeMismatch {
        delta: &'static str,
        position: Position,
        found: ValueKind,
    },

    /// A delta kind or position that cannot occur in this container.
    #[error("{delta} delta at {position} cannot appear in an {container}")]
    UnexpectedDelta {
        delta: &'static str,
        position: Position,
        container: ValueKind,
    },

    /// Deltas left over after walking the container.
    #[error("{count} delta(s) do not match any position in {container}")]
    UnconsumedDeltas { container: ValueKind, count: usize },

    /// A moved element's nested delta could not be applied.
    #[error("failed to resolve moved value: {0}")]
    Delta(#[from] DeltaError),
}

/// Convenience alias for formatting results.
pub type FormatResult<T> = Result<T, FormatError>;
