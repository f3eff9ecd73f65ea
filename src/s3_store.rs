use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::env;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use crate::error::{GatewayError, GatewayResult};
use crate::store::{BucketStats, GetOutcome, ListPage, ObjectStore, ObjectSummary, PutOutcome};
use crate::types::{ByteStream, PresignedUrl};

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: String,
}

impl S3StoreConfig {
    /// Read connection settings from `BLOB_GATEWAY_*` environment variables
    pub fn from_env() -> GatewayResult<Self> {
        fn get_env(key: &str) -> GatewayResult<String> {
            env::var(key)
                .map_err(|_| GatewayError::invalid(format!("{} environment variable required", key)))
        }

        Ok(Self {
            region: get_env("BLOB_GATEWAY_REGION")?,
            access_key_id: get_env("BLOB_GATEWAY_ACCESS_KEY_ID")?,
            secret_access_key: get_env("BLOB_GATEWAY_SECRET_ACCESS_KEY")?,
            endpoint_url: get_env("BLOB_GATEWAY_ENDPOINT_URL")?,
        })
    }
}

/// [`ObjectStore`] backed by any S3-compatible service (AWS S3, MinIO,
/// RustFS, LocalStack) through the AWS SDK.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    endpoint_url: String,
}

impl S3ObjectStore {
    /// Connect using settings from the environment
    pub async fn from_env() -> GatewayResult<Self> {
        Ok(Self::with_config(S3StoreConfig::from_env()?).await)
    }

    pub async fn with_config(config: S3StoreConfig) -> Self {
        let endpoint_url = config.endpoint_url.trim_end_matches('/').to_string();
        let client = Self::create_client(config).await;
        Self {
            client,
            endpoint_url,
        }
    }

    async fn create_client(config: S3StoreConfig) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "blob-gateway",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url)
            .load()
            .await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true) // MinIO/RustFS-style services need path-style addressing
                .build(),
        )
    }

    fn locator(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint_url, bucket, key)
    }

    async fn collect_stream(mut stream: ByteStream) -> GatewayResult<Vec<u8>> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }

    fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
    }
}

/// Map an SDK failure to the gateway's error taxonomy: backend-reported
/// absence and conflicts become their own kinds, timeouts stay distinct
/// from transport failures, anything else is a wrapped backend error.
fn classify_sdk<E>(
    operation: &'static str,
    bucket: &str,
    key: Option<&str>,
    err: SdkError<E>,
) -> GatewayError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if let Some(code) = err.as_service_error().and_then(|service| service.code()) {
        match code {
            "NoSuchKey" => {
                return GatewayError::object_not_found(bucket, key.unwrap_or_default());
            }
            "NoSuchBucket" => return GatewayError::bucket_not_found(bucket),
            "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" => {
                return GatewayError::bucket_already_exists(bucket);
            }
            _ => {}
        }
    }

    match err {
        SdkError::TimeoutError(_) => GatewayError::timeout(operation),
        failure @ SdkError::DispatchFailure(_) => GatewayError::unavailable(operation, failure),
        other => GatewayError::backend(other),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> GatewayResult<PutOutcome> {
        let data = Self::collect_stream(stream).await?;
        let size_bytes = data.len() as u64;
        let body = AwsByteStream::from(data);

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let result = request
            .send()
            .await
            .map_err(|err| classify_sdk("put", bucket, Some(key), err))?;

        Ok(PutOutcome {
            locator: self.locator(bucket, key),
            size_bytes,
            etag: result.e_tag,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> GatewayResult<GetOutcome> {
        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_sdk("get", bucket, Some(key), err))?;

        let size_bytes = result.content_length.unwrap_or(0) as u64;
        let content_type = result.content_type;
        let last_modified = result.last_modified.as_ref().and_then(Self::to_chrono);

        // Hand the body through as it arrives; nothing is buffered here.
        let stream = ReaderStream::new(result.body.into_async_read());

        Ok(GetOutcome {
            stream: Box::pin(stream),
            size_bytes,
            content_type,
            last_modified,
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        // DeleteObject is idempotent at the protocol level: an absent key
        // still returns 204.
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_sdk("delete", bucket, Some(key), err))?;
        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> GatewayResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut identifiers = Vec::with_capacity(keys.len());
        for key in keys {
            identifiers.push(
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(GatewayError::backend)?,
            );
        }
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(GatewayError::backend)?;

        self.client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|err| classify_sdk("delete_many", bucket, None, err))?;
        Ok(())
    }

    async fn list(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<&str>,
        limit: usize,
    ) -> GatewayResult<ListPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(limit as i32);

        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }
        // An empty token is malformed to the backend; only a real cursor
        // is ever forwarded.
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.continuation_token(token);
        }

        let result = request
            .send()
            .await
            .map_err(|err| classify_sdk("list", bucket, None, err))?;

        let items = result
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let key = object.key?;
                Some(ObjectSummary::new(
                    key,
                    object.size.unwrap_or(0) as u64,
                    object.storage_class.map(|tier| tier.as_str().to_string()),
                    object.last_modified.as_ref().and_then(Self::to_chrono),
                ))
            })
            .collect();

        let next_token = result
            .next_continuation_token
            .filter(|token| !token.is_empty());

        Ok(ListPage { items, next_token })
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> GatewayResult<PresignedUrl> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(GatewayError::backend)?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| classify_sdk("presign_get", bucket, Some(key), err))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_in,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .map(|service| service.is_not_found())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(err) => Err(classify_sdk("bucket_exists", bucket, None, err)),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> GatewayResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| classify_sdk("create_bucket", bucket, None, err))?;
        Ok(())
    }

    async fn bucket_stats(&self, bucket: &str) -> GatewayResult<BucketStats> {
        let mut stats = BucketStats::default();
        let mut token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(ref token) = token {
                request = request.continuation_token(token);
            }

            let result = request
                .send()
                .await
                .map_err(|err| classify_sdk("bucket_stats", bucket, None, err))?;

            for object in result.contents.unwrap_or_default() {
                stats.object_count += 1;
                stats.total_size_bytes += object.size.unwrap_or(0) as u64;
            }

            match result
                .next_continuation_token
                .filter(|next| !next.is_empty())
            {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(stats)
    }

    async fn delete_bucket(&self, bucket: &str) -> GatewayResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| classify_sdk("delete_bucket", bucket, None, err))?;
        Ok(())
    }
}
