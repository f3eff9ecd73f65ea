use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::GatewayResult;
use crate::keys::extension_of;
use crate::listing::human_size;
use crate::types::{ByteStream, PresignedUrl};

/// Core object storage operations - must be implemented by all storage
/// backends.
///
/// This is the only layer that knows a backend's wire protocol. No method
/// retries internally; retry policy belongs to callers. Every method
/// respects caller cancellation by being an ordinary future the caller may
/// drop or time-box.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object from a stream
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> GatewayResult<PutOutcome>;

    /// Get an object as a stream. Bytes flow from the backend to the caller
    /// as they arrive; implementations must not buffer the whole object.
    async fn get(&self, bucket: &str, key: &str) -> GatewayResult<GetOutcome>;

    /// Delete an object. Idempotent: deleting an absent key succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()>;

    /// Delete a batch of objects
    async fn delete_many(&self, bucket: &str, keys: &[String]) -> GatewayResult<()>;

    /// List one page of objects. `token` is `None` on the first call and is
    /// never an empty string.
    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        limit: usize,
    ) -> GatewayResult<ListPage>;

    /// Generate a time-limited read URL without making the object public
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> GatewayResult<PresignedUrl>;

    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool>;

    /// Create a bucket. Not idempotent: creating an existing bucket is a
    /// conflict, surfaced rather than silently succeeding.
    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()>;

    /// Aggregate object count and total size. May be approximate for very
    /// large buckets.
    async fn bucket_stats(&self, bucket: &str) -> GatewayResult<BucketStats>;

    /// Delete a bucket. Callers are responsible for emptying it first if
    /// the backend requires empty buckets for deletion.
    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub locator: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
}

/// Result of a get operation
pub struct GetOutcome {
    pub stream: ByteStream,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Summary of one object in a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: u64,
    pub size_human: String,
    pub extension: Option<String>,
    pub storage_tier: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectSummary {
    pub fn new(
        key: String,
        size_bytes: u64,
        storage_tier: Option<String>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            size_human: human_size(size_bytes),
            extension: extension_of(&key),
            key,
            size_bytes,
            storage_tier,
            last_modified,
        }
    }
}

/// One page of a bucket listing.
///
/// `next_token` of `None` signals the final page. Consumers must loop until
/// the token is absent rather than assume a bounded item count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage {
    pub items: Vec<ObjectSummary>,
    pub next_token: Option<String>,
}

impl ListPage {
    /// A terminal empty page
    pub fn end() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }
}

/// Aggregate bucket statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BucketStats {
    pub object_count: u64,
    pub total_size_bytes: u64,
}
