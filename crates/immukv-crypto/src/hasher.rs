use immukv_types::{EntryHash, Sequence, TimestampMs};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::canonical::to_canonical_bytes;

/// The exact field set covered by an entry hash.
///
/// Version ids, etags and the hash itself are deliberately not part of this
/// struct, so they can never leak into the digest.
#[derive(Clone, Copy, Debug)]
pub struct HashInput<'a> {
    pub sequence: Sequence,
    pub key: &'a str,
    /// The value exactly as stored, never a decoded-and-re-encoded copy.
    pub value: &'a Value,
    pub timestamp_ms: TimestampMs,
    pub previous_hash: &'a EntryHash,
}

impl HashInput<'_> {
    /// The document whose canonical encoding is hashed.
    pub fn to_document(&self) -> Value {
        json!({
            "sequence": self.sequence.value(),
            "key": self.key,
            "value": self.value,
            "timestamp_ms": self.timestamp_ms.as_millis(),
            "previous_hash": self.previous_hash.as_str(),
        })
    }
}

/// SHA-256 entry hasher.
///
/// `hash = "sha256:" + hex(sha256(canonical({sequence, key, value, timestamp_ms, previous_hash})))`
pub struct EntryHasher;

impl EntryHasher {
    /// Compute the chain hash for an entry.
    pub fn compute(input: &HashInput<'_>) -> EntryHash {
        let bytes = to_canonical_bytes(&input.to_document());
        let digest: [u8; 32] = Sha256::digest(&bytes).into();
        EntryHash::from_digest(&digest)
    }

    /// Recompute and compare. A mismatch is a `false`, never an error.
    pub fn verify(input: &HashInput<'_>, expected: &EntryHash) -> bool {
        Self::compute(input) == *expected
    }

    /// Sentinel previous-hash of the first entry.
    pub fn genesis() -> EntryHash {
        EntryHash::genesis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input<'a>(value: &'a Value, previous: &'a EntryHash) -> HashInput<'a> {
        HashInput {
            sequence: Sequence::new(0).unwrap(),
            key: "test-key",
            value,
            timestamp_ms: TimestampMs::new(1_700_000_000_000).unwrap(),
            previous_hash: previous,
        }
    }

    #[test]
    fn format_is_prefixed_lowercase_hex() {
        let value = json!({"data": "value"});
        let genesis = EntryHasher::genesis();
        let hash = EntryHasher::compute(&input(&value, &genesis));
        assert!(hash.as_str().starts_with("sha256:"));
        assert_eq!(hash.as_str().len(), 71);
        assert!(hash.as_str()[7..]
            .chars()
            .all(|c| "0123456789abcdef".contains(c)));
    }

    #[test]
    fn digest_covers_canonical_document() {
        let value = json!({"b": 2, "a": 1});
        let genesis = EntryHasher::genesis();
        let hash = EntryHasher::compute(&input(&value, &genesis));

        let canonical = r#"{"key":"test-key","previous_hash":"sha256:genesis","sequence":0,"timestamp_ms":1700000000000,"value":{"a":1,"b":2}}"#;
        let digest: [u8; 32] = Sha256::digest(canonical.as_bytes()).into();
        assert_eq!(hash, EntryHash::from_digest(&digest));
    }

    #[test]
    fn every_field_changes_the_hash() {
        let value = json!({"data": "value"});
        let other_value = json!({"data": "other"});
        let genesis = EntryHasher::genesis();
        let other_prev = EntryHash::from_digest(&[7; 32]);
        let base = input(&value, &genesis);
        let base_hash = EntryHasher::compute(&base);

        let variants = [
            HashInput { sequence: Sequence::new(1).unwrap(), ..base },
            HashInput { key: "other-key", ..base },
            HashInput { value: &other_value, ..base },
            HashInput { timestamp_ms: TimestampMs::new(1_700_000_000_001).unwrap(), ..base },
            HashInput { previous_hash: &other_prev, ..base },
        ];
        for variant in &variants {
            assert_ne!(EntryHasher::compute(variant), base_hash);
        }
    }

    #[test]
    fn verify_reports_mismatch_as_false() {
        let value = json!([1, 2, 3]);
        let genesis = EntryHasher::genesis();
        let hash = EntryHasher::compute(&input(&value, &genesis));
        assert!(EntryHasher::verify(&input(&value, &genesis), &hash));

        let tampered = json!([1, 2, 4]);
        assert!(!EntryHasher::verify(&input(&tampered, &genesis), &hash));
    }

    proptest! {
        #[test]
        fn deterministic(seq in 0i64..1_000_000, key in "[a-z0-9/_-]{1,24}", n in any::<i64>(), ts in 1i64..i64::MAX) {
            let value = json!({"n": n, "key": key});
            let genesis = EntryHasher::genesis();
            let a = HashInput {
                sequence: Sequence::new(seq).unwrap(),
                key: &key,
                value: &value,
                timestamp_ms: TimestampMs::new(ts).unwrap(),
                previous_hash: &genesis,
            };
            prop_assert_eq!(EntryHasher::compute(&a), EntryHasher::compute(&a));
        }
    }
}
