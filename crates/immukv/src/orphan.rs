use immukv_types::TimestampMs;

use crate::records::StoredLogEntry;

/// Result of the most recent orphan check. Client-local and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct OrphanStatus {
    /// `false` means the latest entry was verified as propagated, which is
    /// different from not having checked at all (no status).
    pub is_orphaned: bool,
    pub orphan_key: Option<String>,
    pub orphan_entry: Option<StoredLogEntry>,
    pub checked_at: TimestampMs,
}

impl OrphanStatus {
    pub fn repaired(checked_at: TimestampMs) -> Self {
        Self {
            is_orphaned: false,
            orphan_key: None,
            orphan_entry: None,
            checked_at,
        }
    }

    pub fn orphaned(entry: StoredLogEntry, checked_at: TimestampMs) -> Self {
        Self {
            is_orphaned: true,
            orphan_key: Some(entry.entry.key.clone()),
            orphan_entry: Some(entry),
            checked_at,
        }
    }

    /// The cached orphan entry, if this status records one for `key`.
    pub fn entry_for(&self, key: &str) -> Option<&StoredLogEntry> {
        if !self.is_orphaned || self.orphan_key.as_deref() != Some(key) {
            return None;
        }
        self.orphan_entry.as_ref()
    }
}

/// Mutable per-view cache. Advisory only: losing an update costs a repeat
/// check, never correctness.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClientState {
    pub can_write: Option<bool>,
    pub last_repair_check: Option<TimestampMs>,
    pub orphan_status: Option<OrphanStatus>,
}

impl ClientState {
    /// Fold in the outcome of a repair pass. Unknown outcomes keep the
    /// previous values.
    pub fn record_repair(
        &mut self,
        can_write: Option<bool>,
        orphan_status: Option<OrphanStatus>,
        at: TimestampMs,
    ) {
        if can_write.is_some() {
            self.can_write = can_write;
        }
        if orphan_status.is_some() {
            self.orphan_status = orphan_status;
        }
        self.last_repair_check = Some(at);
    }

    /// Known to be unable to write, either by configuration or by a
    /// previous access-denied repair.
    pub fn believes_read_only(&self, configured_read_only: bool) -> bool {
        configured_read_only || self.can_write == Some(false)
    }

    pub fn repair_due(&self, now: TimestampMs, interval_ms: u64) -> bool {
        match self.last_repair_check {
            Some(last) => now.saturating_since(last) >= interval_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RawLogEntry;
    use immukv_types::{EntryHash, LogVersionId, Sequence};
    use serde_json::json;

    fn ts(ms: i64) -> TimestampMs {
        TimestampMs::new(ms).unwrap()
    }

    fn stored(key: &str) -> StoredLogEntry {
        StoredLogEntry {
            version_id: LogVersionId::new("v1").unwrap(),
            entry: RawLogEntry::seal(
                Sequence::new(0).unwrap(),
                key,
                json!(1),
                ts(10),
                None,
                EntryHash::genesis(),
                None,
            ),
        }
    }

    #[test]
    fn entry_for_matches_key_only_when_orphaned() {
        let status = OrphanStatus::orphaned(stored("a"), ts(5));
        assert!(status.entry_for("a").is_some());
        assert!(status.entry_for("b").is_none());
        assert!(OrphanStatus::repaired(ts(5)).entry_for("a").is_none());
    }

    #[test]
    fn record_repair_keeps_known_values() {
        let mut state = ClientState::default();
        state.record_repair(Some(false), Some(OrphanStatus::orphaned(stored("a"), ts(1))), ts(1));
        state.record_repair(None, None, ts(2));
        assert_eq!(state.can_write, Some(false));
        assert!(state.orphan_status.as_ref().is_some_and(|s| s.is_orphaned));
        assert_eq!(state.last_repair_check, Some(ts(2)));
        assert!(state.believes_read_only(false));
    }

    #[test]
    fn repair_interval() {
        let mut state = ClientState::default();
        assert!(state.repair_due(ts(1), 1_000));
        state.record_repair(None, None, ts(1_000));
        assert!(!state.repair_due(ts(1_999), 1_000));
        assert!(state.repair_due(ts(2_000), 1_000));
        assert!(state.repair_due(ts(1_000), 0));
    }
}
