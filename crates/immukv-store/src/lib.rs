//! Versioned object store adapter for ImmuKV.
//!
//! ImmuKV has no server of its own. Everything it needs from the outside
//! world is five calls against a versioned object store:
//!
//! - GET an object, optionally at a specific version
//! - PUT an object, optionally conditioned on `If-Match` / `If-None-Match: *`
//! - HEAD an object for its current etag
//! - LIST the versions under a prefix, newest first per key
//! - LIST the object names under a prefix
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- versioned, precondition-enforcing store for
//!   tests and embedding, with fault injection
//!
//! # Contract
//!
//! 1. Every successful PUT mints a new, immutable, retrievable version id.
//! 2. A failed precondition is reported as [`StoreError::PreconditionFailed`]
//!    and leaves the object untouched.
//! 3. The store never interprets object contents.

pub mod error;
pub mod layout;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{ErrorClass, StoreError, StoreResult};
pub use layout::StorageLayout;
pub use memory::{InMemoryObjectStore, PutRecord};
pub use object::{
    Encryption, GetObjectOutput, GetObjectRequest, HeadObjectOutput, ListObjectsOutput,
    ListObjectsRequest, ListVersionsOutput, ListVersionsRequest, ObjectVersion, Precondition,
    PutObjectOutput, PutObjectRequest, JSON_CONTENT_TYPE,
};
pub use traits::ObjectStore;
