use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use immukv_store::{
    Encryption, GetObjectRequest, ListVersionsRequest, ObjectStore, PutObjectRequest,
    StorageLayout,
};
use immukv_types::LogVersionId;
use tracing::debug;

use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::records::{RawLogEntry, StoredLogEntry};

/// State shared by every view of one client: the store handle, configuration
/// and the closed flag. Views created with `with_codec` share one connection.
pub(crate) struct Connection {
    pub store: Arc<dyn ObjectStore>,
    pub config: ClientConfig,
    pub layout: StorageLayout,
    pub clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(config: ClientConfig, store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        let layout = StorageLayout::new(config.prefix.clone());
        Self {
            store,
            config,
            layout,
            clock,
            closed: AtomicBool::new(false),
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn ensure_open(&self) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// A JSON write carrying the configured encryption.
    pub fn json_put(&self, path: String, body: bytes::Bytes) -> PutObjectRequest {
        PutObjectRequest::json(path, body)
            .with_encryption(Encryption::from_kms_key(self.config.kms_key_id.as_deref()))
    }

    /// One log version, read raw.
    pub async fn read_log_version(&self, version_id: &LogVersionId) -> ClientResult<StoredLogEntry> {
        let out = self
            .store
            .get_object(GetObjectRequest::version(
                self.layout.log_path(),
                version_id.as_str(),
            ))
            .await?;
        Ok(StoredLogEntry {
            version_id: LogVersionId::new(out.version_id)?,
            entry: RawLogEntry::from_slice(&out.body)?,
        })
    }

    /// Up to `limit` raw log entries, newest first, starting after `before`
    /// when given. No limit reads to the start of the log.
    pub async fn raw_log_entries(
        &self,
        before: Option<&LogVersionId>,
        limit: Option<usize>,
    ) -> ClientResult<Vec<StoredLogEntry>> {
        let mut entries = Vec::new();
        if limit == Some(0) {
            return Ok(entries);
        }

        let log_path = self.layout.log_path();
        let mut request = ListVersionsRequest::new(log_path.clone());
        if let Some(before) = before {
            request = request.after_version(log_path.clone(), before.as_str());
        }

        loop {
            let page = self.store.list_object_versions(request.clone()).await?;
            debug!(
                path = %log_path,
                versions = page.versions.len(),
                truncated = page.is_truncated,
                "log version page"
            );
            for version in page.versions.iter().filter(|v| v.path == log_path) {
                let version_id = LogVersionId::new(version.version_id.clone())?;
                entries.push(self.read_log_version(&version_id).await?);
                if limit.is_some_and(|limit| entries.len() >= limit) {
                    return Ok(entries);
                }
            }
            if !page.is_truncated {
                return Ok(entries);
            }
            request.key_marker = page.next_key_marker;
            request.version_id_marker = page.next_version_id_marker;
        }
    }
}
