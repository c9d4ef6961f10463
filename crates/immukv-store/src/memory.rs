use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use immukv_types::ETag;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::object::{
    Encryption, GetObjectOutput, GetObjectRequest, HeadObjectOutput, ListObjectsOutput,
    ListObjectsRequest, ListVersionsOutput, ListVersionsRequest, ObjectVersion, Precondition,
    PutObjectOutput, PutObjectRequest,
};
use crate::traits::ObjectStore;

const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-memory, versioned object store.
///
/// Intended for tests and embedding. It enforces the same conditional-write
/// rules as a real versioned bucket, mints a fresh version id per write, and
/// computes etags as content fingerprints so identical bodies share an etag.
///
/// Every operation yields to the async runtime once before touching state,
/// so several clients driven by `tokio::join!` genuinely interleave their
/// read-check-write sequences.
///
/// Test hooks: [`deny_writes`](Self::deny_writes) turns every PUT into a 403,
/// [`fail_next_puts`](Self::fail_next_puts) injects service errors for one
/// path, and [`puts`](Self::puts) records what was written.
pub struct InMemoryObjectStore {
    inner: RwLock<StoreState>,
    page_size: usize,
}

#[derive(Default)]
struct StoreState {
    /// Versions per path, oldest first.
    objects: BTreeMap<String, Vec<StoredVersion>>,
    deny_writes: bool,
    failing_puts: HashMap<String, usize>,
    puts: Vec<PutRecord>,
    request_counter: u64,
}

#[derive(Clone, Debug)]
struct StoredVersion {
    version_id: String,
    etag: ETag,
    body: Bytes,
}

/// A successful write as observed by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRecord {
    pub path: String,
    pub version_id: String,
    pub content_type: String,
    pub encryption: Encryption,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap every listing page at `page_size` entries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// When `true`, every PUT fails with 403 Forbidden.
    pub fn deny_writes(&self, deny: bool) {
        if let Ok(mut state) = self.inner.write() {
            state.deny_writes = deny;
        }
    }

    /// Fail the next `count` PUTs to `path` with a 500 service error.
    pub fn fail_next_puts(&self, path: impl Into<String>, count: usize) {
        if let Ok(mut state) = self.inner.write() {
            state.failing_puts.insert(path.into(), count);
        }
    }

    /// Every successful PUT, oldest first.
    pub fn puts(&self) -> Vec<PutRecord> {
        self.inner
            .read()
            .map(|state| state.puts.clone())
            .unwrap_or_default()
    }

    /// Number of versions stored at `path`.
    pub fn version_count(&self, path: &str) -> usize {
        self.inner
            .read()
            .map(|state| state.objects.get(path).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Bodies of every version at `path`, newest first.
    pub fn version_bodies(&self, path: &str) -> Vec<Bytes> {
        self.inner
            .read()
            .map(|state| {
                state
                    .objects
                    .get(path)
                    .map(|versions| versions.iter().rev().map(|v| v.body.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Number of distinct object paths.
    pub fn object_count(&self) -> usize {
        self.inner
            .read()
            .map(|state| state.objects.len())
            .unwrap_or(0)
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Service {
        status: 500,
        code: "InternalError".into(),
        message: "in-memory store lock poisoned".into(),
        request_id: None,
    }
}

fn content_etag(body: &[u8]) -> StoreResult<ETag> {
    let digest = Sha256::digest(body);
    Ok(ETag::new(format!("\"{}\"", hex::encode(&digest[..16])))?)
}

fn new_version_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, request: GetObjectRequest) -> StoreResult<GetObjectOutput> {
        tokio::task::yield_now().await;
        let state = self.read_state()?;
        let versions = state
            .objects
            .get(&request.path)
            .ok_or_else(|| StoreError::NoSuchKey {
                path: request.path.clone(),
            })?;

        let found = match &request.version_id {
            Some(version_id) => versions
                .iter()
                .find(|v| &v.version_id == version_id)
                .ok_or_else(|| StoreError::NoSuchVersion {
                    path: request.path.clone(),
                    version_id: version_id.clone(),
                })?,
            None => versions.last().ok_or_else(|| StoreError::NoSuchKey {
                path: request.path.clone(),
            })?,
        };

        Ok(GetObjectOutput {
            body: found.body.clone(),
            etag: found.etag.clone(),
            version_id: found.version_id.clone(),
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<PutObjectOutput> {
        tokio::task::yield_now().await;
        let mut state = self.write_state()?;
        state.request_counter += 1;
        let request_id = format!("mem-{}", state.request_counter);

        if state.deny_writes {
            return Err(StoreError::Forbidden { path: request.path });
        }

        if let Some(remaining) = state.failing_puts.get_mut(&request.path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Service {
                    status: 500,
                    code: "InternalError".into(),
                    message: format!("injected failure writing {}", request.path),
                    request_id: Some(request_id),
                });
            }
        }

        let current = state
            .objects
            .get(&request.path)
            .and_then(|versions| versions.last());
        let holds = match &request.precondition {
            Precondition::None => true,
            Precondition::IfMatch(expected) => current.is_some_and(|v| &v.etag == expected),
            Precondition::IfNoneMatch => current.is_none(),
        };
        if !holds {
            debug!(path = %request.path, precondition = ?request.precondition, "precondition failed");
            return Err(StoreError::PreconditionFailed { path: request.path });
        }

        let etag = content_etag(&request.body)?;
        let version_id = new_version_id();
        state
            .objects
            .entry(request.path.clone())
            .or_default()
            .push(StoredVersion {
                version_id: version_id.clone(),
                etag: etag.clone(),
                body: request.body,
            });
        state.puts.push(PutRecord {
            path: request.path,
            version_id: version_id.clone(),
            content_type: request.content_type,
            encryption: request.encryption,
        });

        Ok(PutObjectOutput { etag, version_id })
    }

    async fn head_object(&self, path: &str) -> StoreResult<HeadObjectOutput> {
        tokio::task::yield_now().await;
        let state = self.read_state()?;
        let latest = state
            .objects
            .get(path)
            .and_then(|versions| versions.last())
            .ok_or_else(|| StoreError::NoSuchKey {
                path: path.to_string(),
            })?;
        Ok(HeadObjectOutput {
            etag: latest.etag.clone(),
            version_id: latest.version_id.clone(),
        })
    }

    async fn list_object_versions(
        &self,
        request: ListVersionsRequest,
    ) -> StoreResult<ListVersionsOutput> {
        tokio::task::yield_now().await;
        let state = self.read_state()?;
        let limit = request.max_keys.unwrap_or(self.page_size).min(self.page_size).max(1);

        let mut candidates = Vec::new();
        for (path, versions) in state.objects.range(request.prefix.clone()..) {
            if !path.starts_with(&request.prefix) {
                break;
            }
            let newest_first = versions.iter().rev().enumerate();
            match (&request.key_marker, &request.version_id_marker) {
                (Some(marker), _) if path < marker => continue,
                (Some(marker), None) if path == marker => continue,
                (Some(marker), Some(version_marker)) if path == marker => {
                    let position = versions
                        .iter()
                        .rev()
                        .position(|v| &v.version_id == version_marker)
                        .ok_or_else(|| StoreError::Service {
                            status: 400,
                            code: "InvalidArgument".into(),
                            message: format!("unknown version id marker {version_marker}"),
                            request_id: None,
                        })?;
                    for (i, v) in newest_first.skip(position + 1) {
                        candidates.push((path, v, i == 0));
                    }
                }
                _ => {
                    for (i, v) in newest_first {
                        candidates.push((path, v, i == 0));
                    }
                }
            }
            if candidates.len() > limit {
                break;
            }
        }

        let is_truncated = candidates.len() > limit;
        candidates.truncate(limit);
        let versions: Vec<ObjectVersion> = candidates
            .into_iter()
            .map(|(path, v, is_latest)| ObjectVersion {
                path: path.clone(),
                version_id: v.version_id.clone(),
                etag: v.etag.clone(),
                is_latest,
            })
            .collect();
        let (next_key_marker, next_version_id_marker) = match (is_truncated, versions.last()) {
            (true, Some(last)) => (Some(last.path.clone()), Some(last.version_id.clone())),
            _ => (None, None),
        };

        Ok(ListVersionsOutput {
            versions,
            is_truncated,
            next_key_marker,
            next_version_id_marker,
        })
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> StoreResult<ListObjectsOutput> {
        tokio::task::yield_now().await;
        let state = self.read_state()?;
        let limit = request.max_keys.unwrap_or(self.page_size).min(self.page_size).max(1);
        let after = request
            .continuation_token
            .as_ref()
            .or(request.start_after.as_ref());

        let mut paths: Vec<String> = state
            .objects
            .range(request.prefix.clone()..)
            .map(|(path, _)| path)
            .take_while(|path| path.starts_with(&request.prefix))
            .filter(|path| after.map_or(true, |after| path.as_str() > after.as_str()))
            .take(limit + 1)
            .cloned()
            .collect();

        let is_truncated = paths.len() > limit;
        paths.truncate(limit);
        let next_continuation_token = if is_truncated { paths.last().cloned() } else { None };

        Ok(ListObjectsOutput {
            paths,
            is_truncated,
            next_continuation_token,
        })
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.object_count())
            .field("page_size", &self.page_size)
            .finish()
    }
}
