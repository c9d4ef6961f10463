//! Foundation types for ImmuKV.
//!
//! Every identifier that crosses the object-store boundary gets its own
//! nominal type so that a log version id can never be passed where a
//! key-object version id or an etag is expected.
//!
//! # Key Types
//!
//! - [`Sequence`]: global, strictly increasing log position (`-1` before the first write)
//! - [`TimestampMs`]: wall-clock epoch milliseconds, always positive
//! - [`EntryHash`]: `sha256:<hex>` chain hash or the genesis sentinel
//! - [`LogVersionId`] / [`KeyVersionId`]: store-minted version ids of the log and key objects
//! - [`ETag`]: opaque content fingerprint used for conditional writes

pub mod error;
pub mod hash;
pub mod sequence;
pub mod temporal;
pub mod version;

pub use error::TypeError;
pub use hash::EntryHash;
pub use sequence::Sequence;
pub use temporal::TimestampMs;
pub use version::{ETag, KeyVersionId, LogVersionId};
