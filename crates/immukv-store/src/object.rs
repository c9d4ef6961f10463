//! Request and response shapes for the object store capability contract.

use bytes::Bytes;
use immukv_types::ETag;

/// Content type used for every ImmuKV document.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Write precondition for optimistic concurrency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional write.
    #[default]
    None,
    /// `If-Match: <etag>` -- succeed only if the current version has this etag.
    IfMatch(ETag),
    /// `If-None-Match: *` -- succeed only if the object does not exist yet.
    IfNoneMatch,
}

impl Precondition {
    /// `IfMatch` when an etag was observed, otherwise `IfNoneMatch`.
    pub fn from_observed(etag: Option<&ETag>) -> Self {
        match etag {
            Some(etag) => Self::IfMatch(etag.clone()),
            None => Self::IfNoneMatch,
        }
    }
}

/// Server-side encryption requested on write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Encryption {
    #[default]
    None,
    /// `aws:kms` with the given key id.
    Kms { key_id: String },
}

impl Encryption {
    pub fn from_kms_key(key_id: Option<&str>) -> Self {
        match key_id {
            Some(key_id) => Self::Kms {
                key_id: key_id.to_string(),
            },
            None => Self::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetObjectRequest {
    pub path: String,
    pub version_id: Option<String>,
}

impl GetObjectRequest {
    /// Read the current version.
    pub fn latest(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version_id: None,
        }
    }

    /// Read a specific version.
    pub fn version(path: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version_id: Some(version_id.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetObjectOutput {
    pub body: Bytes,
    pub etag: ETag,
    pub version_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub path: String,
    pub body: Bytes,
    pub content_type: String,
    pub precondition: Precondition,
    pub encryption: Encryption,
}

impl PutObjectRequest {
    /// A JSON document write with no precondition and no encryption.
    pub fn json(path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            precondition: Precondition::None,
            encryption: Encryption::None,
        }
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }

    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = encryption;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub etag: ETag,
    pub version_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadObjectOutput {
    pub etag: ETag,
    pub version_id: String,
}

/// Version listing request.
///
/// Results are ordered by key ascending, then newest version first within a
/// key. `key_marker` alone resumes after that key; `key_marker` together with
/// `version_id_marker` resumes after that version of that key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListVersionsRequest {
    pub prefix: String,
    pub key_marker: Option<String>,
    pub version_id_marker: Option<String>,
    pub max_keys: Option<usize>,
}

impl ListVersionsRequest {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Resume after `version_id` of the object at `path`.
    pub fn after_version(mut self, path: impl Into<String>, version_id: impl Into<String>) -> Self {
        self.key_marker = Some(path.into());
        self.version_id_marker = Some(version_id.into());
        self
    }
}

/// One entry of a version listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectVersion {
    pub path: String,
    pub version_id: String,
    pub etag: ETag,
    pub is_latest: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListVersionsOutput {
    pub versions: Vec<ObjectVersion>,
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}

/// Object name listing request. A continuation token takes precedence over
/// `start_after`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub prefix: String,
    pub start_after: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListObjectsOutput {
    pub paths: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}
