//! Cryptographic primitives for ImmuKV.
//!
//! Provides the canonical JSON encoding that every implementation must agree
//! on byte-for-byte, SHA-256 entry hashing over that encoding, and hash chain
//! verification over newest-first runs of log entries.
//!
//! All hashing wraps `sha2`; there is no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::{to_canonical_bytes, to_canonical_string, to_canonical_value, CanonicalError};
pub use chain::{ChainError, ChainLink, ChainVerifier};
pub use hasher::{EntryHasher, HashInput};
