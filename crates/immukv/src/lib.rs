//! ImmuKV: an immutable, hash-chained key-value store built on nothing but a
//! versioned object store.
//!
//! There is no server, lock service or background process. Every write is
//! one conditional PUT against a single log object, whose store versions
//! form the global, totally ordered history. Per-key objects hold the latest
//! snapshot of each key for cheap point reads and are brought up to date by
//! any client that notices they lag the log.
//!
//! ```text
//! {prefix}_log.json        one version per entry, hash-chained
//! {prefix}keys/{key}.json  latest snapshot per key
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use immukv::{ClientConfig, ImmuKvClient, JsonCodec};
//! use immukv_store::InMemoryObjectStore;
//! use serde_json::json;
//!
//! # async fn demo() -> immukv::ClientResult<()> {
//! let store = Arc::new(InMemoryObjectStore::new());
//! let client = ImmuKvClient::new(ClientConfig::new("bucket", "us-east-1", "app/"), store, JsonCodec)?;
//! client.set("sensor-01", json!({"temp": 21})).await?;
//! let entry = client.get("sensor-01").await?;
//! assert!(client.verify(&entry));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
mod connection;
pub mod error;
pub mod orphan;
pub mod records;
mod repair;

pub use client::{ImmuKvClient, MAX_WRITE_ATTEMPTS};
pub use clock::{Clock, MockClock, SystemClock};
pub use codec::{CodecError, FnCodec, JsonCodec, SerdeCodec, ValueCodec};
pub use config::{ClientConfig, DEFAULT_REPAIR_CHECK_INTERVAL_MS};
pub use error::{ClientError, ClientResult};
pub use orphan::OrphanStatus;
pub use records::{Entry, RawKeyObject, RawLogEntry, StoredLogEntry};

pub use immukv_types::{ETag, EntryHash, KeyVersionId, LogVersionId, Sequence, TimestampMs};
