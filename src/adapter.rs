use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::bucket::validate_bucket_name;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::keys::{KeyStrategy, TimeOrderedKeyStrategy};
use crate::listing::{filter_by_extension, WALK_PAGE_SIZE};
use crate::sniff;
use crate::store::{BucketStats, GetOutcome, ListPage, ObjectStore};
use crate::types::{PresignedUrl, StoredObject, UploadRequest};

/// The orchestration layer callers embed: validation, naming, timeout
/// budgets, and fan-out concurrency in front of an [`ObjectStore`].
///
/// Validation failures (bad bucket name, rejected media type) are resolved
/// locally and never reach the backend. Backend failures propagate as
/// distinct error kinds without any internal retry.
pub struct StorageAdapter {
    store: Arc<dyn ObjectStore>,
    keys: Arc<dyn KeyStrategy>,
    config: GatewayConfig,
}

impl StorageAdapter {
    /// Create a new adapter with the default time-ordered key strategy
    pub fn new<S: ObjectStore + 'static>(store: S, config: GatewayConfig) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(TimeOrderedKeyStrategy::new()),
            config,
        }
    }

    /// Create with a custom key strategy
    pub fn with_key_strategy<S: ObjectStore + 'static, K: KeyStrategy + 'static>(
        store: S,
        keys: K,
        config: GatewayConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(keys),
            config,
        }
    }

    /// Upload one object: sniff and validate content, generate a key,
    /// persist under the upload deadline, and record the locator on the
    /// request.
    pub async fn upload_one(
        &self,
        bucket: &str,
        request: &mut UploadRequest,
    ) -> GatewayResult<StoredObject> {
        validate_bucket_name(bucket)?;
        upload_request(&self.store, &self.keys, &self.config, bucket, request).await
    }

    /// Upload several objects concurrently, all-or-nothing.
    ///
    /// One task per request; the first failure aborts every in-flight
    /// sibling (dropping its stream) and fails the whole call. Locators
    /// come back in input order, not completion order. Backend writes that
    /// finished before the failure are not rolled back: after an error the
    /// caller re-lists before retrying, and retried uploads get fresh keys.
    pub async fn upload_many(
        &self,
        bucket: &str,
        requests: Vec<UploadRequest>,
    ) -> GatewayResult<Vec<String>> {
        validate_bucket_name(bucket)?;

        let count = requests.len();
        let mut tasks: JoinSet<GatewayResult<(usize, String)>> = JoinSet::new();
        for (index, mut request) in requests.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let keys = Arc::clone(&self.keys);
            let config = self.config.clone();
            let bucket = bucket.to_string();
            tasks.spawn(async move {
                let stored = upload_request(&store, &keys, &config, &bucket, &mut request).await?;
                Ok((index, stored.locator))
            });
        }

        let mut completed: Vec<(usize, String)> = Vec::with_capacity(count);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(slot)) => completed.push(slot),
                Ok(Err(err)) => {
                    warn!(bucket, %err, "multi-upload failed, aborting siblings");
                    tasks.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(GatewayError::backend(join_err));
                }
            }
        }

        completed.sort_by_key(|(index, _)| *index);
        Ok(completed
            .into_iter()
            .map(|(_, locator)| locator)
            .collect())
    }

    /// Open an object for streaming download. The caller owns the returned
    /// stream and must drain or drop it on every exit path.
    pub async fn download(&self, bucket: &str, key: &str) -> GatewayResult<GetOutcome> {
        validate_bucket_name(bucket)?;
        self.store.get(bucket, key).await
    }

    /// Issue a presigned read URL with the policy-fixed expiry
    pub async fn presigned_url(&self, bucket: &str, key: &str) -> GatewayResult<PresignedUrl> {
        validate_bucket_name(bucket)?;
        self.store
            .presign_get(bucket, key, self.config.effective_presign_expiry())
            .await
    }

    /// List one page, optionally filtered by extension.
    ///
    /// Filtering happens after the backend page is fetched and never
    /// changes the continuation token: keep paginating on the token even
    /// when a filtered page comes back empty.
    pub async fn list(
        &self,
        bucket: &str,
        extension_filter: Option<&str>,
        token: Option<&str>,
        limit: usize,
    ) -> GatewayResult<ListPage> {
        validate_bucket_name(bucket)?;
        let page = self.store.list(bucket, None, token, limit).await?;
        Ok(match extension_filter {
            Some(extension) => filter_by_extension(page, extension),
            None => page,
        })
    }

    /// Delete one object under the delete deadline. Idempotent.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        validate_bucket_name(bucket)?;
        timeout(self.config.delete_timeout, self.store.delete(bucket, key))
            .await
            .map_err(|_| GatewayError::timeout("delete"))??;
        debug!(bucket, key, "object deleted");
        Ok(())
    }

    /// Create a bucket, surfacing a conflict if it already exists.
    ///
    /// The existence pre-check and the create are two backend calls, so
    /// concurrent callers racing on the same name may still collide at the
    /// backend; the conflict then surfaces as the backend's own error.
    pub async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        validate_bucket_name(bucket)?;
        if self.store.bucket_exists(bucket).await? {
            return Err(GatewayError::bucket_already_exists(bucket));
        }
        self.store.create_bucket(bucket).await?;
        debug!(bucket, "bucket created");
        Ok(())
    }

    /// Delete a bucket. If the backend requires empty buckets, emptying
    /// first is the caller's responsibility; nothing is emptied
    /// automatically here.
    pub async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()> {
        validate_bucket_name(bucket)?;
        self.store.delete_bucket(bucket).await?;
        debug!(bucket, "bucket deleted");
        Ok(())
    }

    /// Delete every object in a bucket, page by page. An already-empty
    /// bucket is a no-op success. Returns the number of objects deleted.
    pub async fn empty_bucket(&self, bucket: &str) -> GatewayResult<u64> {
        validate_bucket_name(bucket)?;

        let mut deleted: u64 = 0;
        let mut token: Option<String> = None;
        loop {
            let page = self
                .store
                .list(bucket, None, token.as_deref(), WALK_PAGE_SIZE)
                .await?;
            if !page.items.is_empty() {
                let keys: Vec<String> = page.items.into_iter().map(|item| item.key).collect();
                deleted += keys.len() as u64;
                self.store.delete_many(bucket, &keys).await?;
            }
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(bucket, deleted, "bucket emptied");
        Ok(deleted)
    }

    /// Aggregate object count and total size for a bucket
    pub async fn bucket_stats(&self, bucket: &str) -> GatewayResult<BucketStats> {
        validate_bucket_name(bucket)?;
        self.store.bucket_stats(bucket).await
    }

    /// Get configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Shared per-request upload path: Validate -> Name -> Persist -> Complete
async fn upload_request(
    store: &Arc<dyn ObjectStore>,
    keys: &Arc<dyn KeyStrategy>,
    config: &GatewayConfig,
    bucket: &str,
    request: &mut UploadRequest,
) -> GatewayResult<StoredObject> {
    if let Some(size) = request.size_hint {
        if size > config.max_object_bytes {
            return Err(GatewayError::invalid(format!(
                "object size {} exceeds maximum {}",
                size, config.max_object_bytes
            )));
        }
    }

    let prefix = request.read_sniff_prefix().await?;
    let media = sniff::classify(&prefix);
    config.ensure_allowed(media)?;

    let key = keys.object_key(&request.original_name);
    let stream = request.take_stream()?;

    let outcome = timeout(
        config.upload_timeout,
        store.put(bucket, &key, Some(media.mime()), stream),
    )
    .await
    .map_err(|_| GatewayError::timeout("put"))??;

    request.record_locator(outcome.locator.clone());
    debug!(bucket, key = %key, size = outcome.size_bytes, "object uploaded");

    Ok(StoredObject {
        key,
        size_bytes: outcome.size_bytes,
        content_type: media.mime().to_string(),
        locator: outcome.locator,
        last_modified: chrono::Utc::now(),
    })
}
