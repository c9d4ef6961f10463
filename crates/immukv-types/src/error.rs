use thiserror::Error;

/// Errors produced when constructing or parsing foundation types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid sequence (must be >= -1): {0}")]
    InvalidSequence(i64),

    #[error("invalid timestamp (must be > 0): {0}")]
    InvalidTimestamp(i64),

    #[error("sequence {0} cannot advance")]
    SequenceOverflow(i64),

    #[error("invalid hash format (must be 'sha256:' and 64 lowercase hex digits): {0}")]
    InvalidHash(String),

    #[error("empty {0} is not allowed")]
    Empty(&'static str),
}
