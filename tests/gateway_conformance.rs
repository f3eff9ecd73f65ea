use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;

use blob_gateway::{
    listing, GatewayConfig, GatewayError, KeyStrategy, MemoryObjectStore, ObjectStore,
    StorageAdapter, UploadRequest,
};

const BUCKET: &str = "conformance";

/// Test factory functions
fn png_payload(extra: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend((0..extra).map(|i| (i % 251) as u8));
    data
}

fn upload(name: &str, data: Vec<u8>) -> UploadRequest {
    UploadRequest::new(name, Cursor::new(data))
}

async fn adapter_with_bucket() -> StorageAdapter {
    let adapter = StorageAdapter::new(MemoryObjectStore::new(), GatewayConfig::default());
    adapter.create_bucket(BUCKET).await.unwrap();
    adapter
}

/// Keys derived from the original name, so tests can correlate inputs with
/// locators. Production uses the time-ordered strategy instead.
struct NamedKeys;

impl KeyStrategy for NamedKeys {
    fn object_key(&self, original_name: &str) -> String {
        original_name.to_string()
    }
}

async fn drain(mut stream: blob_gateway::ByteStream) -> Vec<u8> {
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    collected
}

fn assert_invalid_bucket(result: Result<(), GatewayError>) {
    assert!(matches!(result, Err(GatewayError::InvalidBucketName { .. })));
}

/// 1. Bucket-name validation is total and consistent: every operation that
/// takes a bucket rejects the same malformed name the same way, before any
/// backend call.
#[tokio::test]
async fn bucket_validation_is_consistent_across_operations() {
    let adapter = StorageAdapter::new(MemoryObjectStore::new(), GatewayConfig::default());
    let bad = "Bad_Bucket";

    assert_invalid_bucket(adapter.create_bucket(bad).await);
    assert_invalid_bucket(adapter.delete_bucket(bad).await);
    assert_invalid_bucket(adapter.delete_object(bad, "k").await);
    assert_invalid_bucket(adapter.download(bad, "k").await.map(|_| ()));
    assert_invalid_bucket(adapter.presigned_url(bad, "k").await.map(|_| ()));
    assert_invalid_bucket(adapter.list(bad, None, None, 10).await.map(|_| ()));
    assert_invalid_bucket(adapter.bucket_stats(bad).await.map(|_| ()));
    assert_invalid_bucket(adapter.empty_bucket(bad).await.map(|_| ()));

    let mut request = upload("a.png", png_payload(4));
    assert_invalid_bucket(adapter.upload_one(bad, &mut request).await.map(|_| ()));
    assert_invalid_bucket(
        adapter
            .upload_many(bad, vec![upload("b.png", png_payload(4))])
            .await
            .map(|_| ()),
    );
}

/// 2. The sniffer ignores the claimed filename: identical PNG bytes are
/// accepted as image/png whatever the name says.
#[tokio::test]
async fn sniffer_ignores_claimed_extension() {
    let adapter = adapter_with_bucket().await;

    for name in ["photo.png", "photo.txt", "photo"] {
        let mut request = upload(name, png_payload(16));
        let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();
        assert_eq!(stored.content_type, "image/png", "for claimed name {name}");
        assert_eq!(request.locator(), Some(stored.locator.as_str()));
    }
}

/// 2b. A spoofed extension does not get plain text past the allow-list,
/// and the rejection looks identical to any other unsupported type.
#[tokio::test]
async fn spoofed_extension_is_rejected() {
    let adapter = adapter_with_bucket().await;

    let mut request = upload("notes.png", b"just some text".to_vec());
    let err = adapter.upload_one(BUCKET, &mut request).await.unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedMediaType));
    assert!(request.locator().is_none());
}

/// 4. All-or-nothing multi-upload: one engineered validation failure fails
/// the whole call; the return value reports no partial success.
#[tokio::test]
async fn multi_upload_is_all_or_nothing() {
    let adapter = adapter_with_bucket().await;

    let requests = vec![
        upload("one.png", png_payload(8)),
        upload("two.png", png_payload(8)),
        upload("three.png", b"not an image at all".to_vec()),
        upload("four.png", png_payload(8)),
        upload("five.png", png_payload(8)),
    ];

    let result = adapter.upload_many(BUCKET, requests).await;
    assert!(matches!(result, Err(GatewayError::UnsupportedMediaType)));
}

/// Result ordering of upload_many matches input order, not completion
/// order.
#[tokio::test]
async fn multi_upload_preserves_input_order() {
    let adapter = StorageAdapter::with_key_strategy(
        MemoryObjectStore::new(),
        NamedKeys,
        GatewayConfig::default(),
    );
    adapter.create_bucket(BUCKET).await.unwrap();

    let requests: Vec<UploadRequest> = (0..8usize)
        .map(|i| upload(&format!("file-{i}.png"), png_payload(32 * (8 - i))))
        .collect();

    let locators = adapter.upload_many(BUCKET, requests).await.unwrap();
    assert_eq!(locators.len(), 8);
    for (i, locator) in locators.iter().enumerate() {
        assert!(
            locator.ends_with(&format!("file-{i}.png")),
            "slot {i} holds {locator}"
        );
    }
}

/// 5. Pagination termination: 237 objects at page size 50 enumerate as
/// exactly 5 pages and 237 items, with the final token absent.
#[tokio::test]
async fn pagination_enumerates_exactly() {
    let store = MemoryObjectStore::new();
    store.create_bucket(BUCKET).await.unwrap();
    for i in 0..237 {
        let body = futures::stream::once(async { Ok(Bytes::from_static(b"x")) });
        store
            .put(BUCKET, &format!("obj-{i:04}"), None, Box::pin(body))
            .await
            .unwrap();
    }

    let mut pages = 0;
    let mut items = 0;
    let mut token: Option<String> = None;
    loop {
        let page = store
            .list(BUCKET, None, token.as_deref(), 50)
            .await
            .unwrap();
        pages += 1;
        items += page.items.len();
        match page.next_token {
            Some(next) => {
                assert!(!next.is_empty(), "empty token must be absent, not literal");
                token = Some(next);
            }
            None => break,
        }
    }

    assert_eq!(pages, 5);
    assert_eq!(items, 237);
}

/// The whole-bucket stream walks every page without materializing the
/// bucket.
#[tokio::test]
async fn stream_objects_walks_all_pages() {
    let store = Arc::new(MemoryObjectStore::new());
    store.create_bucket(BUCKET).await.unwrap();
    for i in 0..2050 {
        let body = futures::stream::once(async { Ok(Bytes::from_static(b"y")) });
        store
            .put(BUCKET, &format!("walk-{i:05}"), None, Box::pin(body))
            .await
            .unwrap();
    }

    let stream = listing::stream_objects(
        store.clone() as Arc<dyn ObjectStore>,
        BUCKET.to_string(),
        None,
    );
    futures_util::pin_mut!(stream);

    let mut seen = 0;
    while let Some(item) = stream.next().await {
        item.unwrap();
        seen += 1;
    }
    assert_eq!(seen, 2050);
}

/// 6. Deleting the same key twice succeeds both times.
#[tokio::test]
async fn delete_is_idempotent() {
    let adapter = adapter_with_bucket().await;

    let mut request = upload("gone.png", png_payload(8));
    let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();

    adapter.delete_object(BUCKET, &stored.key).await.unwrap();
    adapter.delete_object(BUCKET, &stored.key).await.unwrap();
    adapter.delete_object(BUCKET, "never-existed").await.unwrap();
}

/// 7. Presigned locator lifetime is the configured policy expiry, echoed
/// by the fake backend.
#[tokio::test]
async fn presign_expiry_is_policy_fixed() {
    let config = GatewayConfig::default();
    let expected = config.effective_presign_expiry();
    let adapter = StorageAdapter::new(MemoryObjectStore::new(), config);
    adapter.create_bucket(BUCKET).await.unwrap();

    let mut request = upload("link.pdf", b"%PDF-1.7 tiny".to_vec());
    let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();

    let link = adapter.presigned_url(BUCKET, &stored.key).await.unwrap();
    assert_eq!(link.expires_in, expected);
    assert!(link
        .url
        .ends_with(&format!("expires_in={}", expected.as_secs())));
}

/// The policy cap clamps an oversized configured expiry.
#[tokio::test]
async fn presign_expiry_is_capped_by_policy() {
    let config = GatewayConfig::default().with_presign_expiry(Duration::from_secs(7 * 24 * 3600));
    let cap = config.max_presign_expiry;
    let adapter = StorageAdapter::new(MemoryObjectStore::new(), config);
    adapter.create_bucket(BUCKET).await.unwrap();

    let mut request = upload("cap.png", png_payload(4));
    let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();

    let link = adapter.presigned_url(BUCKET, &stored.key).await.unwrap();
    assert_eq!(link.expires_in, cap);
}

/// 8. Upload-then-download round-trips byte-identical content.
#[tokio::test]
async fn upload_download_round_trip() {
    let adapter = adapter_with_bucket().await;
    let payload = png_payload(4096);

    let mut request = upload("round.png", payload.clone());
    let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();
    assert_eq!(stored.size_bytes, payload.len() as u64);

    let outcome = adapter.download(BUCKET, &stored.key).await.unwrap();
    assert_eq!(outcome.content_type.as_deref(), Some("image/png"));
    assert_eq!(drain(outcome.stream).await, payload);
}

/// Creating a bucket that exists is a conflict, never a silent success.
#[tokio::test]
async fn create_bucket_conflicts_on_existing() {
    let adapter = adapter_with_bucket().await;

    let err = adapter.create_bucket(BUCKET).await.unwrap_err();
    assert!(matches!(err, GatewayError::BucketAlreadyExists { .. }));
}

/// Emptying walks all pages; an already-empty bucket is a no-op success.
#[tokio::test]
async fn empty_bucket_counts_and_noops() {
    let adapter = adapter_with_bucket().await;

    for i in 0..12 {
        let mut request = upload(&format!("bulk-{i}.png"), png_payload(8));
        adapter.upload_one(BUCKET, &mut request).await.unwrap();
    }

    assert_eq!(adapter.empty_bucket(BUCKET).await.unwrap(), 12);
    assert_eq!(adapter.empty_bucket(BUCKET).await.unwrap(), 0);

    let stats = adapter.bucket_stats(BUCKET).await.unwrap();
    assert_eq!(stats.object_count, 0);
    assert_eq!(stats.total_size_bytes, 0);
}

/// Stats aggregate object count and total size.
#[tokio::test]
async fn bucket_stats_aggregate() {
    let adapter = adapter_with_bucket().await;

    let mut total = 0u64;
    for i in 1..=4 {
        let payload = png_payload(100 * i);
        total += payload.len() as u64;
        let mut request = upload(&format!("stat-{i}.png"), payload);
        adapter.upload_one(BUCKET, &mut request).await.unwrap();
    }

    let stats = adapter.bucket_stats(BUCKET).await.unwrap();
    assert_eq!(stats.object_count, 4);
    assert_eq!(stats.total_size_bytes, total);
}

/// Download after delete reports absence as its own error kind.
#[tokio::test]
async fn download_missing_object_is_not_found() {
    let adapter = adapter_with_bucket().await;

    let mut request = upload("fleeting.png", png_payload(8));
    let stored = adapter.upload_one(BUCKET, &mut request).await.unwrap();
    adapter.delete_object(BUCKET, &stored.key).await.unwrap();

    let err = adapter.download(BUCKET, &stored.key).await.unwrap_err();
    assert!(matches!(err, GatewayError::ObjectNotFound { .. }));
}
