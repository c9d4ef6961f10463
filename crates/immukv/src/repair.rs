//! Orphan detection and repair.
//!
//! An orphan is a log entry whose key object never caught up, because the
//! writer failed or crashed between the log write and the key-object write.
//! Every `set`, and `get` on a schedule, reads the latest log entry and
//! re-applies it to its key object with a conditional write keyed on the etag
//! the writer observed. Whoever gets there first wins; everyone else sees a
//! precondition failure, which here means "already repaired".
//!
//! Everything in this module handles raw JSON only.

use immukv_store::{GetObjectRequest, Precondition};
use immukv_types::{ETag, EntryHash, LogVersionId, Sequence};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::ClientResult;
use crate::orphan::OrphanStatus;
use crate::records::{RawKeyObject, RawLogEntry, StoredLogEntry};

/// Head of the log as seen by one write attempt.
#[derive(Clone, Debug)]
pub(crate) struct LatestLogState {
    /// `None` when the log does not exist yet.
    pub log_etag: Option<ETag>,
    pub prev_version_id: Option<LogVersionId>,
    pub prev_hash: EntryHash,
    pub sequence: Sequence,
    /// Writability learned during repair, `None` if unknown.
    pub can_write: Option<bool>,
    pub orphan_status: Option<OrphanStatus>,
}

impl LatestLogState {
    fn genesis() -> Self {
        Self {
            log_etag: None,
            prev_version_id: None,
            prev_hash: EntryHash::genesis(),
            sequence: Sequence::initial(),
            can_write: None,
            orphan_status: None,
        }
    }
}

/// Outcome of one repair attempt: `(can_write, orphan_status)`, either of
/// which may be unknown.
pub(crate) type RepairOutcome = (Option<bool>, Option<OrphanStatus>);

impl Connection {
    /// Read the head of the log and repair it if it is orphaned.
    ///
    /// `believes_read_only` selects the HEAD-only path; `known_can_write` is
    /// echoed back when the HEAD check learns nothing new.
    pub async fn latest_and_repair(
        &self,
        believes_read_only: bool,
        known_can_write: Option<bool>,
    ) -> ClientResult<LatestLogState> {
        let out = match self
            .store
            .get_object(GetObjectRequest::latest(self.layout.log_path()))
            .await
        {
            Ok(out) => out,
            Err(e) if e.is_not_found() => {
                debug!("log is empty, starting from genesis");
                return Ok(LatestLogState::genesis());
            }
            Err(e) => return Err(e.into()),
        };

        let latest = StoredLogEntry {
            version_id: LogVersionId::new(out.version_id)?,
            entry: RawLogEntry::from_slice(&out.body)?,
        };
        let (can_write, orphan_status) = self
            .repair_orphan(&latest, believes_read_only, known_can_write)
            .await?;

        Ok(LatestLogState {
            log_etag: Some(out.etag),
            prev_hash: latest.entry.hash.clone(),
            sequence: latest.entry.sequence,
            prev_version_id: Some(latest.version_id),
            can_write,
            orphan_status,
        })
    }

    /// Propagate `latest` to its key object.
    ///
    /// Only a failed existence check is an error. Write failures become an
    /// outcome: a precondition failure is a completed repair, access denied
    /// marks the client as unable to write, anything else is unknown.
    pub async fn repair_orphan(
        &self,
        latest: &StoredLogEntry,
        believes_read_only: bool,
        known_can_write: Option<bool>,
    ) -> ClientResult<RepairOutcome> {
        let key = &latest.entry.key;
        let key_path = self.layout.key_path(key);

        if believes_read_only {
            return match self.store.head_object(&key_path).await {
                Ok(_) => Ok((
                    known_can_write,
                    Some(OrphanStatus::repaired(self.clock.now_ms())),
                )),
                Err(e) if e.is_not_found() => {
                    debug!(key = %key, sequence = %latest.entry.sequence, "latest entry is orphaned");
                    Ok((
                        Some(false),
                        Some(OrphanStatus::orphaned(latest.clone(), self.clock.now_ms())),
                    ))
                }
                Err(e) => Err(e.into()),
            };
        }

        let checked_at = self.clock.now_ms();
        let body = RawKeyObject::from_log(latest).to_body()?;
        let precondition =
            Precondition::from_observed(latest.entry.previous_key_object_etag.as_ref());
        let creating = precondition == Precondition::IfNoneMatch;
        let request = self.json_put(key_path, body).with_precondition(precondition);

        match self.store.put_object(request).await {
            Ok(_) => {
                if creating {
                    info!(key = %key, sequence = %latest.entry.sequence, "created key object");
                } else {
                    info!(key = %key, sequence = %latest.entry.sequence, "propagated log entry to key object");
                }
                Ok((Some(true), Some(OrphanStatus::repaired(checked_at))))
            }
            Err(e) if e.is_precondition_failed() => {
                debug!(key = %key, "key object already up to date");
                Ok((Some(true), Some(OrphanStatus::repaired(checked_at))))
            }
            Err(e) if e.is_forbidden() => {
                info!(key = %key, "write access denied, orphan repair disabled");
                Ok((
                    Some(false),
                    Some(OrphanStatus::orphaned(latest.clone(), checked_at)),
                ))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "pre-flight repair failed");
                Ok((None, None))
            }
        }
    }
}
