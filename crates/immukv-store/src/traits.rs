use async_trait::async_trait;

use crate::error::StoreResult;
use crate::object::{
    GetObjectOutput, GetObjectRequest, HeadObjectOutput, ListObjectsOutput, ListObjectsRequest,
    ListVersionsOutput, ListVersionsRequest, PutObjectOutput, PutObjectRequest,
};

/// Versioned object store with conditional writes.
///
/// All implementations must satisfy these invariants:
/// - Every successful `put_object` creates a new version with a fresh,
///   permanent version id. Older versions stay readable by id.
/// - A precondition that does not hold fails the write with
///   `PreconditionFailed` and leaves the object unchanged.
/// - Two conditional writes against the same observed etag never both
///   succeed.
/// - Missing objects and versions are reported as `NoSuchKey` /
///   `NoSuchVersion`, never as a generic error.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the current version, or a specific version when one is given.
    async fn get_object(&self, request: GetObjectRequest) -> StoreResult<GetObjectOutput>;

    /// Write a new version, subject to the request's precondition.
    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<PutObjectOutput>;

    /// Etag and version id of the current version.
    async fn head_object(&self, path: &str) -> StoreResult<HeadObjectOutput>;

    /// One page of version descriptors under a prefix.
    async fn list_object_versions(
        &self,
        request: ListVersionsRequest,
    ) -> StoreResult<ListVersionsOutput>;

    /// One page of object names under a prefix, in lexicographic order.
    async fn list_objects(&self, request: ListObjectsRequest) -> StoreResult<ListObjectsOutput>;
}
