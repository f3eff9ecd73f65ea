//! In-memory [`ObjectStore`] for tests and local development.
//!
//! Implements the full trait contract, including continuation-token
//! pagination and presigned URLs that echo the expiry they were given, so
//! orchestration logic can be exercised without a network.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{GatewayError, GatewayResult};
use crate::store::{BucketStats, GetOutcome, ListPage, ObjectStore, ObjectSummary, PutOutcome};
use crate::types::{ByteStream, PresignedUrl};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

/// In-memory object store double
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, StoredBlob>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locator(bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }

    async fn collect_stream(mut stream: ByteStream) -> GatewayResult<Vec<u8>> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> GatewayResult<PutOutcome> {
        let data = Self::collect_stream(stream).await?;
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))?;

        let size_bytes = data.len() as u64;
        objects.insert(
            key.to_string(),
            StoredBlob {
                data: Bytes::from(data),
                content_type: content_type.map(str::to_string),
                last_modified: Utc::now(),
            },
        );

        Ok(PutOutcome {
            locator: Self::locator(bucket, key),
            size_bytes,
            etag: None,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> GatewayResult<GetOutcome> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))?;
        let blob = objects
            .get(key)
            .ok_or_else(|| GatewayError::object_not_found(bucket, key))?
            .clone();

        let size_bytes = blob.data.len() as u64;
        let stream = futures::stream::once(async move { Ok(blob.data) });

        Ok(GetOutcome {
            stream: Box::pin(stream),
            size_bytes,
            content_type: blob.content_type,
            last_modified: Some(blob.last_modified),
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;
        if let Some(objects) = buckets.get_mut(bucket) {
            for key in keys {
                objects.remove(key);
            }
        }
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        limit: usize,
    ) -> GatewayResult<ListPage> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))?;

        let after = match token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };

        let mut items = Vec::new();
        let mut remainder = false;
        for (key, blob) in objects.range((after, Bound::Unbounded)) {
            if let Some(prefix) = prefix {
                if !key.starts_with(prefix) {
                    continue;
                }
            }
            if items.len() == limit {
                remainder = true;
                break;
            }
            items.push(ObjectSummary::new(
                key.clone(),
                blob.data.len() as u64,
                Some("STANDARD".to_string()),
                Some(blob.last_modified),
            ));
        }

        let next_token = if remainder {
            items.last().map(|item| item.key.clone())
        } else {
            None
        };

        Ok(ListPage { items, next_token })
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> GatewayResult<PresignedUrl> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))?;
        if !objects.contains_key(key) {
            return Err(GatewayError::object_not_found(bucket, key));
        }

        // Echo the expiry in the URL so tests can observe it.
        let url = format!(
            "{}?expires_in={}",
            Self::locator(bucket, key),
            expires_in.as_secs()
        );

        Ok(PresignedUrl {
            url,
            expires_in,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Err(GatewayError::bucket_already_exists(bucket));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn bucket_stats(&self, bucket: &str) -> GatewayResult<BucketStats> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))?;

        Ok(BucketStats {
            object_count: objects.len() as u64,
            total_size_bytes: objects.values().map(|blob| blob.data.len() as u64).sum(),
        })
    }

    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()> {
        let mut buckets = self.buckets.write().await;
        buckets
            .remove(bucket)
            .map(|_| ())
            .ok_or_else(|| GatewayError::bucket_not_found(bucket))
    }
}
