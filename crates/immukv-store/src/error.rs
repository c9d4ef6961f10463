use immukv_types::TypeError;

/// Errors from object store operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("no such key: {path}")]
    NoSuchKey { path: String },

    /// The object exists but the requested version does not.
    #[error("no such version {version_id} of {path}")]
    NoSuchVersion { path: String, version_id: String },

    /// An `If-Match` / `If-None-Match` condition did not hold.
    #[error("precondition failed for {path}")]
    PreconditionFailed { path: String },

    /// The caller is not allowed to perform the operation.
    #[error("access denied for {path}")]
    Forbidden { path: String },

    /// Any other failure reported by the backend.
    #[error("store error {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// The backend returned an identifier that failed validation.
    #[error("invalid store response: {0}")]
    Type(#[from] TypeError),
}

/// Coarse classification used by callers to decide how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    PreconditionFailed,
    Forbidden,
    Other,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoSuchKey { .. } | Self::NoSuchVersion { .. } => ErrorClass::NotFound,
            Self::PreconditionFailed { .. } => ErrorClass::PreconditionFailed,
            Self::Forbidden { .. } => ErrorClass::Forbidden,
            Self::Service { status: 404, .. } => ErrorClass::NotFound,
            Self::Service { status: 412, .. } => ErrorClass::PreconditionFailed,
            Self::Service { status: 403, .. } => ErrorClass::Forbidden,
            Self::Service { .. } | Self::Type(_) => ErrorClass::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.class() == ErrorClass::PreconditionFailed
    }

    pub fn is_forbidden(&self) -> bool {
        self.class() == ErrorClass::Forbidden
    }

    /// HTTP status code, when the failure maps to one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NoSuchKey { .. } | Self::NoSuchVersion { .. } => Some(404),
            Self::PreconditionFailed { .. } => Some(412),
            Self::Forbidden { .. } => Some(403),
            Self::Service { status, .. } => Some(*status),
            Self::Type(_) => None,
        }
    }

    /// Store error code (`NoSuchKey`, `PreconditionFailed`, ...).
    pub fn code(&self) -> &str {
        match self {
            Self::NoSuchKey { .. } => "NoSuchKey",
            Self::NoSuchVersion { .. } => "NoSuchVersion",
            Self::PreconditionFailed { .. } => "PreconditionFailed",
            Self::Forbidden { .. } => "AccessDenied",
            Self::Service { code, .. } => code,
            Self::Type(_) => "InvalidResponse",
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Service { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
