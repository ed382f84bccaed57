use thiserror::Error;

/// Errors produced while decoding or encoding JSON values.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Convenience alias for value results.
pub type ValueResult<T> = Result<T, ValueError>;
