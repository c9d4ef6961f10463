use immukv_types::{EntryHash, Sequence};
use tracing::error;

use crate::hasher::{EntryHasher, HashInput};

/// Anything that participates in the log hash chain.
///
/// Implementors must hand out the value bytes exactly as they were written
/// or read from the store. Values that went through a caller's decoder and
/// encoder are not acceptable here: a lossy codec would turn a valid entry
/// into a hash mismatch.
pub trait ChainLink {
    /// Fields covered by the entry hash.
    fn hash_input(&self) -> HashInput<'_>;
    /// The hash recorded on the entry.
    fn entry_hash(&self) -> &EntryHash;
}

/// Hash chain integrity verifier for newest-first runs of log entries.
///
/// [`verify_chain`](Self::verify_chain) and [`check_links`](Self::check_links)
/// apply the two protocol rules:
/// 1. every entry's recorded hash matches its recomputed hash
/// 2. each entry's `previous_hash` equals the next-older entry's hash
///
/// [`check_chain`](Self::check_chain) adds two stricter ones:
/// 3. sequences descend by exactly one
/// 4. only sequence 0 may link to the genesis sentinel, and it must
pub struct ChainVerifier;

impl ChainVerifier {
    /// Verify a single entry. Never errors; a mismatch is `false`.
    pub fn verify_entry(entry: &impl ChainLink) -> bool {
        EntryHasher::verify(&entry.hash_input(), entry.entry_hash())
    }

    /// Check entry hashes, then pairwise linkage, reporting the first break.
    ///
    /// The run need not reach back to genesis: a window taken from the head
    /// of the log is checked for internal consistency only.
    pub fn check_links(entries: &[impl ChainLink]) -> Result<(), ChainError> {
        for entry in entries {
            if !Self::verify_entry(entry) {
                return Err(ChainError::HashMismatch {
                    sequence: entry.hash_input().sequence,
                });
            }
        }

        for pair in entries.windows(2) {
            let newer = pair[0].hash_input();
            if newer.previous_hash != pair[1].entry_hash() {
                return Err(ChainError::BrokenLink {
                    newer: newer.sequence,
                    older: pair[1].hash_input().sequence,
                });
            }
        }

        Ok(())
    }

    /// [`check_links`](Self::check_links) plus sequence continuity and
    /// genesis placement.
    pub fn check_chain(entries: &[impl ChainLink]) -> Result<(), ChainError> {
        Self::check_links(entries)?;

        for entry in entries {
            let input = entry.hash_input();
            let links_genesis = input.previous_hash.is_genesis();
            let is_first = input.sequence.value() == 0;
            if links_genesis != is_first {
                return Err(ChainError::GenesisMismatch {
                    sequence: input.sequence,
                });
            }
        }

        for pair in entries.windows(2) {
            let newer = pair[0].hash_input().sequence;
            let older = pair[1].hash_input().sequence;
            if older.next() != Ok(newer) {
                return Err(ChainError::SequenceGap { newer, older });
            }
        }

        Ok(())
    }

    /// Boolean form of [`check_links`](Self::check_links). Logs the break.
    pub fn verify_chain(entries: &[impl ChainLink]) -> bool {
        match Self::check_links(entries) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "hash chain verification failed");
                false
            }
        }
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("hash verification failed for entry {sequence}")]
    HashMismatch { sequence: Sequence },

    #[error("chain broken between entry {newer} and {older}")]
    BrokenLink { newer: Sequence, older: Sequence },

    #[error("sequence gap between entry {newer} and {older}")]
    SequenceGap { newer: Sequence, older: Sequence },

    #[error("entry {sequence} disagrees with the genesis sentinel")]
    GenesisMismatch { sequence: Sequence },
}
