//! Stored documents and the caller-facing entry.
//!
//! [`RawLogEntry`] and [`RawKeyObject`] are the exact JSON documents kept in
//! the store. They carry the value as raw JSON and are what repair and
//! verification operate on. [`Entry`] is produced only at the public
//! boundary, by running the caller's codec over a raw document.

use bytes::Bytes;
use immukv_crypto::{to_canonical_value, ChainLink, EntryHasher, HashInput};
use immukv_types::{ETag, EntryHash, LogVersionId, Sequence, TimestampMs};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{CodecError, ValueCodec};
use crate::error::ClientResult;

/// One version of the log object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub sequence: Sequence,
    pub key: String,
    pub value: Value,
    pub timestamp_ms: TimestampMs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<LogVersionId>,
    pub previous_hash: EntryHash,
    pub hash: EntryHash,
    /// Etag of the key object observed before this entry was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_key_object_etag: Option<ETag>,
}

impl RawLogEntry {
    /// Build a new entry and compute its hash.
    pub fn seal(
        sequence: Sequence,
        key: impl Into<String>,
        value: Value,
        timestamp_ms: TimestampMs,
        previous_version_id: Option<LogVersionId>,
        previous_hash: EntryHash,
        previous_key_object_etag: Option<ETag>,
    ) -> Self {
        let key = key.into();
        let hash = EntryHasher::compute(&HashInput {
            sequence,
            key: &key,
            value: &value,
            timestamp_ms,
            previous_hash: &previous_hash,
        });
        Self {
            sequence,
            key,
            value,
            timestamp_ms,
            previous_version_id,
            previous_hash,
            hash,
            previous_key_object_etag,
        }
    }

    pub fn from_slice(body: &[u8]) -> ClientResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Canonical JSON body as written to the store.
    pub fn to_body(&self) -> ClientResult<Bytes> {
        Ok(Bytes::from(to_canonical_value(self)?))
    }
}

impl ChainLink for RawLogEntry {
    fn hash_input(&self) -> HashInput<'_> {
        HashInput {
            sequence: self.sequence,
            key: &self.key,
            value: &self.value,
            timestamp_ms: self.timestamp_ms,
            previous_hash: &self.previous_hash,
        }
    }

    fn entry_hash(&self) -> &EntryHash {
        &self.hash
    }
}

/// A log entry together with the store version it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredLogEntry {
    pub version_id: LogVersionId,
    pub entry: RawLogEntry,
}

impl ChainLink for StoredLogEntry {
    fn hash_input(&self) -> HashInput<'_> {
        self.entry.hash_input()
    }

    fn entry_hash(&self) -> &EntryHash {
        &self.entry.hash
    }
}

/// Latest repaired snapshot of one key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawKeyObject {
    pub sequence: Sequence,
    pub key: String,
    pub value: Value,
    pub timestamp_ms: TimestampMs,
    pub log_version_id: LogVersionId,
    pub hash: EntryHash,
    pub previous_hash: EntryHash,
}

impl RawKeyObject {
    /// Snapshot of a log entry, copied field for field from the raw document.
    pub fn from_log(stored: &StoredLogEntry) -> Self {
        let entry = &stored.entry;
        Self {
            sequence: entry.sequence,
            key: entry.key.clone(),
            value: entry.value.clone(),
            timestamp_ms: entry.timestamp_ms,
            log_version_id: stored.version_id.clone(),
            hash: entry.hash.clone(),
            previous_hash: entry.previous_hash.clone(),
        }
    }

    pub fn from_slice(body: &[u8]) -> ClientResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn to_body(&self) -> ClientResult<Bytes> {
        Ok(Bytes::from(to_canonical_value(self)?))
    }
}

impl ChainLink for RawKeyObject {
    fn hash_input(&self) -> HashInput<'_> {
        HashInput {
            sequence: self.sequence,
            key: &self.key,
            value: &self.value,
            timestamp_ms: self.timestamp_ms,
            previous_hash: &self.previous_hash,
        }
    }

    fn entry_hash(&self) -> &EntryHash {
        &self.hash
    }
}

/// A log entry as handed to callers.
///
/// `value` is the decoded value; `raw_value` is the JSON exactly as written
/// or read, and is what [`verify`](crate::ImmuKvClient::verify) hashes.
/// `version_id` is always the log version that produced the entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<V> {
    pub key: String,
    pub value: V,
    pub raw_value: Value,
    pub timestamp_ms: TimestampMs,
    pub version_id: LogVersionId,
    pub sequence: Sequence,
    pub previous_version_id: Option<LogVersionId>,
    pub hash: EntryHash,
    pub previous_hash: EntryHash,
    pub previous_key_object_etag: Option<ETag>,
}

impl<V> Entry<V> {
    pub(crate) fn from_log<C: ValueCodec<V> + ?Sized>(
        stored: &StoredLogEntry,
        codec: &C,
    ) -> Result<Self, CodecError> {
        let entry = &stored.entry;
        Ok(Self {
            key: entry.key.clone(),
            value: codec.decode(&entry.value)?,
            raw_value: entry.value.clone(),
            timestamp_ms: entry.timestamp_ms,
            version_id: stored.version_id.clone(),
            sequence: entry.sequence,
            previous_version_id: entry.previous_version_id.clone(),
            hash: entry.hash.clone(),
            previous_hash: entry.previous_hash.clone(),
            previous_key_object_etag: entry.previous_key_object_etag.clone(),
        })
    }

    pub(crate) fn from_key_object<C: ValueCodec<V> + ?Sized>(
        object: RawKeyObject,
        codec: &C,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            value: codec.decode(&object.value)?,
            key: object.key,
            raw_value: object.value,
            timestamp_ms: object.timestamp_ms,
            version_id: object.log_version_id,
            sequence: object.sequence,
            previous_version_id: None,
            hash: object.hash,
            previous_hash: object.previous_hash,
            previous_key_object_etag: None,
        })
    }
}

impl<V> ChainLink for Entry<V> {
    fn hash_input(&self) -> HashInput<'_> {
        HashInput {
            sequence: self.sequence,
            key: &self.key,
            value: &self.raw_value,
            timestamp_ms: self.timestamp_ms,
            previous_hash: &self.previous_hash,
        }
    }

    fn entry_hash(&self) -> &EntryHash {
        &self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonCodec, SerdeCodec};
    use immukv_crypto::ChainVerifier;
    use serde_json::json;

    fn first_entry() -> RawLogEntry {
        RawLogEntry::seal(
            Sequence::initial().next().unwrap(),
            "sensor-01",
            json!({"temp": 21, "unit": "C"}),
            TimestampMs::new(1_700_000_000_000).unwrap(),
            None,
            EntryHash::genesis(),
            None,
        )
    }

    fn stored(entry: RawLogEntry) -> StoredLogEntry {
        StoredLogEntry {
            version_id: LogVersionId::new("v0").unwrap(),
            entry,
        }
    }

    #[test]
    fn sealed_entry_verifies() {
        let entry = first_entry();
        assert!(ChainVerifier::verify_entry(&entry));
        assert_eq!(entry.sequence.value(), 0);
        assert!(entry.previous_hash.is_genesis());
    }

    #[test]
    fn absent_optionals_are_omitted_not_null() {
        let body = first_entry().to_body().unwrap();
        let text = std::str::from_utf8(&body).unwrap();
        assert!(!text.contains("previous_version_id"));
        assert!(!text.contains("previous_key_object_etag"));
        assert!(!text.contains("null"));
        assert!(text.starts_with("{\"hash\":\"sha256:"));
    }

    #[test]
    fn body_round_trips_and_is_canonical() {
        let mut entry = first_entry();
        entry.previous_version_id = Some(LogVersionId::new("prev").unwrap());
        entry.previous_key_object_etag = Some(ETag::new("\"etag-1\"").unwrap());
        let body = entry.to_body().unwrap();
        let parsed = RawLogEntry::from_slice(&body).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(parsed.to_body().unwrap(), body);
    }

    #[test]
    fn rejects_invalid_documents() {
        assert!(RawLogEntry::from_slice(b"{\"sequence\":0}").is_err());
        let doc = json!({
            "sequence": -5, "key": "k", "value": 1, "timestamp_ms": 1,
            "previous_hash": "sha256:genesis", "hash": "sha256:00"
        });
        assert!(RawLogEntry::from_slice(doc.to_string().as_bytes()).is_err());
        let doc = json!({
            "sequence": 0, "key": "k", "value": 1, "timestamp_ms": 1,
            "previous_hash": "md5:genesis", "hash": "sha256:00"
        });
        assert!(RawLogEntry::from_slice(doc.to_string().as_bytes()).is_err());
    }

    #[test]
    fn key_object_copies_the_log_entry() {
        let stored = stored(first_entry());
        let object = RawKeyObject::from_log(&stored);
        assert_eq!(object.log_version_id, stored.version_id);
        assert_eq!(object.hash, stored.entry.hash);
        assert!(ChainVerifier::verify_entry(&object));

        let text = String::from_utf8(object.to_body().unwrap().to_vec()).unwrap();
        assert!(text.contains("\"log_version_id\":\"v0\""));
        assert!(!text.contains("previous_version_id"));
    }

    #[test]
    fn entry_hashes_the_raw_value() {
        let stored = stored(first_entry());
        let mut entry: Entry<Value> = Entry::from_log(&stored, &JsonCodec).unwrap();
        assert!(ChainVerifier::verify_entry(&entry));

        entry.value = json!("decoded values are not hashed");
        assert!(ChainVerifier::verify_entry(&entry));

        entry.raw_value = json!({"temp": 99, "unit": "C"});
        assert!(!ChainVerifier::verify_entry(&entry));
    }

    #[test]
    fn decode_failure_is_a_codec_error() {
        let stored = stored(first_entry());
        let result = Entry::<String>::from_log(&stored, &SerdeCodec::<String>::new());
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }
}
