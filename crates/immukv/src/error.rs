use immukv_crypto::CanonicalError;
use immukv_store::StoreError;
use immukv_types::TypeError;

use crate::codec::CodecError;

/// Errors surfaced by client operations.
///
/// Precondition races and best-effort repair failures are handled inside the
/// client and never show up here unless the write retries run out.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The key has no key object and no usable orphan fallback.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The requested log version does not exist.
    #[error("log version not found: {version_id}")]
    LogVersionNotFound { version_id: String },

    /// A write was attempted on a read-only client.
    #[error("client is read-only")]
    ReadOnly,

    /// Every log write attempt lost the conditional-write race.
    #[error("failed to write log after {attempts} attempts: {code}: {message}")]
    RetriesExhausted {
        attempts: u32,
        status: Option<u16>,
        code: String,
        message: String,
        request_id: Option<String>,
        #[source]
        source: StoreError,
    },

    /// The caller's codec rejected a value.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// A stored document could not be parsed or produced.
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The shared connection was closed.
    #[error("client is closed")]
    Closed,
}

impl ClientError {
    /// Wrap the last precondition failure of an exhausted write loop.
    pub(crate) fn retries_exhausted(attempts: u32, source: StoreError) -> Self {
        Self::RetriesExhausted {
            attempts,
            status: source.status(),
            code: source.code().to_string(),
            message: source.to_string(),
            request_id: source.request_id().map(str::to_string),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::LogVersionNotFound { .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<CanonicalError> for ClientError {
    fn from(e: CanonicalError) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
