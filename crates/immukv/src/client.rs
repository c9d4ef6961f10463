use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use immukv_crypto::ChainVerifier;
use immukv_store::{
    GetObjectRequest, ListObjectsRequest, ListVersionsRequest, ObjectStore, Precondition,
    StoreError,
};
use immukv_types::{ETag, KeyVersionId, LogVersionId};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec::ValueCodec;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{ClientError, ClientResult};
use crate::orphan::{ClientState, OrphanStatus};
use crate::records::{Entry, RawKeyObject, RawLogEntry, StoredLogEntry};

/// Log write attempts before giving up on a contended log.
pub const MAX_WRITE_ATTEMPTS: u32 = 10;

/// ImmuKV client: one typed view over a shared store connection.
///
/// Every write appends one version to the global log object with a
/// conditional PUT, then best-effort updates the key object. The log is the
/// only source of truth; key objects are a lookup cache that repair brings
/// up to date.
///
/// A view's local state (writability, last repair check, orphan cache) is
/// not shared with other views created by [`with_codec`](Self::with_codec).
/// Closing any view closes them all.
pub struct ImmuKvClient<V, C> {
    conn: Arc<Connection>,
    codec: C,
    state: Mutex<ClientState>,
    _value: PhantomData<fn() -> V>,
}

impl<V, C: ValueCodec<V>> ImmuKvClient<V, C> {
    /// Create a client on the system clock.
    pub fn new(config: ClientConfig, store: Arc<dyn ObjectStore>, codec: C) -> ClientResult<Self> {
        Self::with_clock(config, store, codec, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        store: Arc<dyn ObjectStore>,
        codec: C,
        clock: Arc<dyn Clock>,
    ) -> ClientResult<Self> {
        config.validate()?;
        debug!(bucket = %config.bucket, prefix = %config.prefix, read_only = config.read_only, "client created");
        Ok(Self::from_connection(
            Arc::new(Connection::new(config, store, clock)),
            codec,
        ))
    }

    fn from_connection(conn: Arc<Connection>, codec: C) -> Self {
        Self {
            conn,
            codec,
            state: Mutex::new(ClientState::default()),
            _value: PhantomData,
        }
    }

    /// A view with a different codec over the same connection. The new view
    /// starts with empty local state.
    pub fn with_codec<V2, C2: ValueCodec<V2>>(&self, codec: C2) -> ImmuKvClient<V2, C2> {
        ImmuKvClient::from_connection(Arc::clone(&self.conn), codec)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.conn.config
    }

    /// Close the shared connection. Every view fails with
    /// [`ClientError::Closed`] afterwards.
    pub fn close(&self) {
        self.conn.close();
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }

    /// Cached result of the most recent orphan check, if any.
    pub fn orphan_status(&self) -> Option<OrphanStatus> {
        self.state().orphan_status.clone()
    }

    /// Writability learned from repair: `None` until a repair has told.
    pub fn can_write(&self) -> Option<bool> {
        self.state().can_write
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `(believes_read_only, can_write)` snapshot for a repair pass.
    fn repair_mode(&self) -> (bool, Option<bool>) {
        let state = self.state();
        (
            state.believes_read_only(self.conn.config.read_only),
            state.can_write,
        )
    }

    // ---- Writes ----

    /// Append `value` under `key`.
    ///
    /// Once the log write succeeds the entry is durable; a failed key-object
    /// write afterwards is logged and left for the next repair. The returned
    /// entry's `previous_key_object_etag` is the etag of the key object this
    /// call wrote, or `None` if that write failed.
    pub async fn set(&self, key: &str, value: V) -> ClientResult<Entry<V>> {
        self.conn.ensure_open()?;
        if self.conn.config.read_only {
            return Err(ClientError::ReadOnly);
        }

        let raw_value = self.codec.encode(&value)?;
        let store = &self.conn.store;
        let log_path = self.conn.layout.log_path();
        let key_path = self.conn.layout.key_path(key);

        let mut last_conflict: Option<StoreError> = None;
        let mut committed: Option<(StoredLogEntry, Option<ETag>)> = None;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (believes_read_only, known_can_write) = self.repair_mode();
            let latest = self
                .conn
                .latest_and_repair(believes_read_only, known_can_write)
                .await?;
            self.state().record_repair(
                latest.can_write,
                latest.orphan_status.clone(),
                self.conn.clock.now_ms(),
            );

            let current_key_etag = match store.head_object(&key_path).await {
                Ok(head) => Some(head.etag),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            };

            let entry = RawLogEntry::seal(
                latest.sequence.next()?,
                key,
                raw_value.clone(),
                self.conn.clock.now_ms(),
                latest.prev_version_id.clone(),
                latest.prev_hash.clone(),
                current_key_etag.clone(),
            );
            let request = self
                .conn
                .json_put(log_path.clone(), entry.to_body()?)
                .with_precondition(Precondition::from_observed(latest.log_etag.as_ref()));

            match store.put_object(request).await {
                Ok(out) => {
                    let stored = StoredLogEntry {
                        version_id: LogVersionId::new(out.version_id)?,
                        entry,
                    };
                    debug!(key, sequence = %stored.entry.sequence, attempt, "log entry committed");
                    committed = Some((stored, current_key_etag));
                    break;
                }
                Err(e) if e.is_precondition_failed() => {
                    debug!(key, attempt, max = MAX_WRITE_ATTEMPTS, "log write conflict, retrying");
                    last_conflict = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (stored, current_key_etag) = match (committed, last_conflict) {
            (Some(committed), _) => committed,
            (None, Some(conflict)) => {
                return Err(ClientError::retries_exhausted(MAX_WRITE_ATTEMPTS, conflict))
            }
            (None, None) => {
                return Err(ClientError::retries_exhausted(
                    MAX_WRITE_ATTEMPTS,
                    StoreError::PreconditionFailed { path: log_path },
                ))
            }
        };

        let key_object_etag = self.write_key_object(&stored, current_key_etag).await;
        let entry = stored.entry;
        Ok(Entry {
            key: entry.key,
            value,
            raw_value: entry.value,
            timestamp_ms: entry.timestamp_ms,
            version_id: stored.version_id,
            sequence: entry.sequence,
            previous_version_id: entry.previous_version_id,
            hash: entry.hash,
            previous_hash: entry.previous_hash,
            previous_key_object_etag: key_object_etag,
        })
    }

    /// Second write phase. Failure leaves an orphan and is not an error.
    async fn write_key_object(
        &self,
        stored: &StoredLogEntry,
        current_key_etag: Option<ETag>,
    ) -> Option<ETag> {
        let key = &stored.entry.key;
        let body = match RawKeyObject::from_log(stored).to_body() {
            Ok(body) => body,
            Err(e) => {
                warn!(key = %key, error = %e, "cannot encode key object");
                return None;
            }
        };
        let request = self
            .conn
            .json_put(self.conn.layout.key_path(key), body)
            .with_precondition(Precondition::from_observed(current_key_etag.as_ref()));

        match self.conn.store.put_object(request).await {
            Ok(out) => Some(out.etag),
            Err(e) => {
                warn!(
                    key = %key,
                    log_version_id = %stored.version_id,
                    error = %e,
                    "failed to write key object, entry committed to log but orphaned"
                );
                None
            }
        }
    }

    // ---- Reads ----

    /// Latest value of `key`.
    ///
    /// When the repair interval has elapsed, the head of the log is repaired
    /// first (or, on a client that cannot write, checked). A missing key
    /// object falls back to the cached orphan entry only on clients that
    /// cannot repair it.
    pub async fn get(&self, key: &str) -> ClientResult<Entry<V>> {
        self.conn.ensure_open()?;
        self.maybe_repair().await;

        let key_path = self.conn.layout.key_path(key);
        match self
            .conn
            .store
            .get_object(GetObjectRequest::latest(key_path))
            .await
        {
            Ok(out) => {
                let object = RawKeyObject::from_slice(&out.body)?;
                Ok(Entry::from_key_object(object, &self.codec)?)
            }
            Err(e) if e.is_not_found() => {
                let fallback = {
                    let state = self.state();
                    let usable = state.believes_read_only(self.conn.config.read_only);
                    state
                        .orphan_status
                        .as_ref()
                        .and_then(|status| status.entry_for(key))
                        .filter(|_| usable)
                        .cloned()
                };
                match fallback {
                    Some(orphan) => {
                        debug!(key, sequence = %orphan.entry.sequence, "serving orphan fallback");
                        Ok(Entry::from_log(&orphan, &self.codec)?)
                    }
                    None => Err(ClientError::NotFound {
                        key: key.to_string(),
                    }),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Scheduled repair on the read path. Skipped entirely for clients known
    /// to be unable to write. Failures are logged and ignored.
    async fn maybe_repair(&self) {
        let now = self.conn.clock.now_ms();
        let known_can_write = {
            let state = self.state();
            if state.believes_read_only(self.conn.config.read_only)
                || !state.repair_due(now, self.conn.config.repair_check_interval_ms)
            {
                return;
            }
            state.can_write
        };

        match self.conn.latest_and_repair(false, known_can_write).await {
            Ok(latest) => self
                .state()
                .record_repair(latest.can_write, latest.orphan_status, now),
            Err(e) => {
                warn!(error = %e, "scheduled repair check failed");
                self.state().record_repair(None, None, now);
            }
        }
    }

    /// A specific log version, decoded.
    pub async fn get_log_version(&self, version_id: &LogVersionId) -> ClientResult<Entry<V>> {
        self.conn.ensure_open()?;
        match self.conn.read_log_version(version_id).await {
            Ok(stored) => Ok(Entry::from_log(&stored, &self.codec)?),
            Err(ClientError::Store(e)) if e.is_not_found() => Err(ClientError::LogVersionNotFound {
                version_id: version_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Versions of `key`, newest first.
    ///
    /// Without a cursor, a cached orphan for `key` is listed first. It may
    /// duplicate the newest key-object version if a repair has landed since
    /// the orphan was cached. The orphan counts toward `limit`, but a page
    /// always reads at least one key-object version when any exists, so a
    /// page opening with the orphan can hold `limit + 1` entries.
    ///
    /// The returned cursor is the key-object version id of the oldest version
    /// read, for passing back as `before`.
    pub async fn history(
        &self,
        key: &str,
        before: Option<&KeyVersionId>,
        limit: Option<usize>,
    ) -> ClientResult<(Vec<Entry<V>>, Option<KeyVersionId>)> {
        self.conn.ensure_open()?;
        let mut entries = Vec::new();
        if limit == Some(0) {
            return Ok((entries, None));
        }

        if before.is_none() {
            let orphan = self
                .state()
                .orphan_status
                .as_ref()
                .and_then(|status| status.entry_for(key))
                .cloned();
            if let Some(orphan) = orphan {
                entries.push(Entry::from_log(&orphan, &self.codec)?);
            }
        }

        let key_path = self.conn.layout.key_path(key);
        let mut request = ListVersionsRequest::new(key_path.clone());
        if let Some(before) = before {
            request = request.after_version(key_path.clone(), before.as_str());
        }
        let mut oldest: Option<KeyVersionId> = None;

        loop {
            let page = self.conn.store.list_object_versions(request.clone()).await?;
            for version in page.versions.iter().filter(|v| v.path == key_path) {
                let out = self
                    .conn
                    .store
                    .get_object(GetObjectRequest::version(
                        key_path.clone(),
                        version.version_id.clone(),
                    ))
                    .await?;
                let object = RawKeyObject::from_slice(&out.body)?;
                entries.push(Entry::from_key_object(object, &self.codec)?);
                oldest = Some(KeyVersionId::new(version.version_id.clone())?);
                if limit.is_some_and(|limit| entries.len() >= limit) {
                    return Ok((entries, oldest));
                }
            }
            if !page.is_truncated {
                return Ok((entries, oldest));
            }
            request.key_marker = page.next_key_marker;
            request.version_id_marker = page.next_version_id_marker;
        }
    }

    /// Global log entries, newest first, decoded with this view's codec.
    pub async fn log_entries(
        &self,
        before: Option<&LogVersionId>,
        limit: Option<usize>,
    ) -> ClientResult<Vec<Entry<V>>> {
        self.conn.ensure_open()?;
        self.conn
            .raw_log_entries(before, limit)
            .await?
            .iter()
            .map(|stored| Entry::from_log(stored, &self.codec).map_err(ClientError::from))
            .collect()
    }

    /// Keys in lexicographic order of their object names, starting after
    /// `after_key` when given.
    pub async fn list_keys(
        &self,
        after_key: Option<&str>,
        limit: Option<usize>,
    ) -> ClientResult<Vec<String>> {
        self.conn.ensure_open()?;
        let layout = &self.conn.layout;
        let mut keys = Vec::new();
        if limit == Some(0) {
            return Ok(keys);
        }

        let mut request = ListObjectsRequest {
            prefix: layout.keys_prefix(),
            start_after: after_key.map(|key| layout.key_path(key)),
            ..Default::default()
        };

        loop {
            let page = self.conn.store.list_objects(request.clone()).await?;
            for path in &page.paths {
                let Some(key) = layout.key_from_path(path) else {
                    continue;
                };
                keys.push(key.to_string());
                if limit.is_some_and(|limit| keys.len() >= limit) {
                    return Ok(keys);
                }
            }
            if !page.is_truncated {
                return Ok(keys);
            }
            debug!(keys = keys.len(), "listing next key page");
            request.continuation_token = page.next_continuation_token;
        }
    }

    // ---- Verification ----

    /// Recompute an entry's hash over its raw value.
    pub fn verify(&self, entry: &Entry<V>) -> bool {
        ChainVerifier::verify_entry(entry)
    }

    /// Recompute the hash of a raw log document.
    pub fn verify_raw(&self, entry: &RawLogEntry) -> bool {
        ChainVerifier::verify_entry(entry)
    }

    /// Verify the newest `limit` log entries (all when `None`) as a chain.
    ///
    /// Entries are checked in raw form; this view's codec is never used, so
    /// entries written under any codec verify.
    pub async fn verify_log_chain(&self, limit: Option<usize>) -> ClientResult<bool> {
        self.conn.ensure_open()?;
        let entries = self.conn.raw_log_entries(None, limit).await?;
        Ok(ChainVerifier::verify_chain(&entries))
    }
}

impl<V, C> std::fmt::Debug for ImmuKvClient<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImmuKvClient")
            .field("bucket", &self.conn.config.bucket)
            .field("prefix", &self.conn.config.prefix)
            .field("closed", &self.conn.is_closed())
            .finish()
    }
}
