use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{GatewayError, GatewayResult};
use crate::sniff::SNIFF_WINDOW;

/// Stream of bytes for object content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Byte source for uploads. Must support rewinding to offset zero so the
/// content can be sniffed before it is persisted.
pub trait UploadSource: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> UploadSource for T {}

/// One persisted object, as confirmed by the backend.
///
/// Immutable once created: replacing content means a delete plus a fresh
/// upload under a newly generated key, never an in-place overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub locator: String,
    pub last_modified: DateTime<Utc>,
}

/// A time-limited capability URL for reading one object without making it
/// publicly readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in: Duration,
    pub expires_at: DateTime<Utc>,
}

/// Request to upload one object.
///
/// Owns the byte source exclusively until the upload completes: the adapter
/// reads a sniff prefix and rewinds, then hands the source to the store,
/// which consumes it. After a successful upload the final locator is
/// recorded here for caller inspection.
pub struct UploadRequest {
    pub original_name: String,
    pub size_hint: Option<u64>,
    source: Option<Box<dyn UploadSource>>,
    locator: Option<String>,
}

impl UploadRequest {
    pub fn new<S: Into<String>>(original_name: S, source: impl UploadSource + 'static) -> Self {
        Self {
            original_name: original_name.into(),
            size_hint: None,
            source: Some(Box::new(source)),
            locator: None,
        }
    }

    /// Declare the expected content length, when known up front
    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Locator of the stored object, present after a successful upload
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub(crate) fn record_locator(&mut self, locator: String) {
        self.locator = Some(locator);
    }

    /// Read up to [`SNIFF_WINDOW`] bytes for content classification, then
    /// seek the source back to offset zero.
    ///
    /// A source shorter than the window yields whatever bytes exist. A
    /// source that cannot rewind fails with `UnseekableSource`.
    pub async fn read_sniff_prefix(&mut self) -> GatewayResult<Vec<u8>> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| GatewayError::invalid("upload source already consumed"))?;

        let mut prefix = vec![0u8; SNIFF_WINDOW];
        let mut filled = 0;
        while filled < SNIFF_WINDOW {
            let read = source.read(&mut prefix[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        prefix.truncate(filled);

        source
            .rewind()
            .await
            .map_err(|_| GatewayError::UnseekableSource)?;

        Ok(prefix)
    }

    /// Surrender the byte source as a stream, transferring ownership to the
    /// caller. Fails if the source was already taken.
    pub fn take_stream(&mut self) -> GatewayResult<ByteStream> {
        let source = self
            .source
            .take()
            .ok_or_else(|| GatewayError::invalid("upload source already consumed"))?;
        Ok(Box::pin(ReaderStream::new(source)))
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("original_name", &self.original_name)
            .field("size_hint", &self.size_hint)
            .field("source_taken", &self.source.is_none())
            .field("locator", &self.locator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn sniff_prefix_rewinds_to_start() {
        let data = vec![7u8; SNIFF_WINDOW + 100];
        let mut request = UploadRequest::new("big.bin", Cursor::new(data.clone()));

        let prefix = request.read_sniff_prefix().await.unwrap();
        assert_eq!(prefix.len(), SNIFF_WINDOW);

        // The full content must still be readable from offset zero.
        use futures_util::StreamExt;
        let mut stream = request.take_stream().unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn short_source_yields_available_bytes() {
        let mut request = UploadRequest::new("tiny.bin", Cursor::new(vec![1, 2, 3]));
        let prefix = request.read_sniff_prefix().await.unwrap();
        assert_eq!(prefix, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn source_cannot_be_taken_twice() {
        let mut request = UploadRequest::new("once.bin", Cursor::new(vec![0u8]));
        assert!(request.take_stream().is_ok());
        assert!(request.take_stream().is_err());
    }
}
