//! # blob-gateway: streaming object-storage gateway
//!
//! `blob-gateway` provides validated, presigned, streaming file and bucket
//! management over any S3-compatible object store. It is the policy layer
//! an HTTP (or gRPC, or CLI) front end embeds: content sniffing, key
//! generation, timeout budgets, fan-out uploads, and bucket lifecycle,
//! with no coupling to any server framework.
//!
//! ## Key Features
//!
//! - **Content-sniffed validation**: acceptance is decided from the bytes,
//!   never from a client-supplied filename or header
//! - **Streaming downloads**: bytes flow from the backend to the caller as
//!   they arrive, no server-side buffering
//! - **Presigned URLs**: short-lived capability links without public ACLs
//! - **All-or-nothing multi-upload**: concurrent fan-out where the first
//!   failure cancels every sibling
//! - **Storage agnostic**: any backend behind the [`ObjectStore`] trait
//!   (S3-compatible services in production, in-memory for tests)
//!
//! ## Quick Start
//!
//! ```no_run
//! use blob_gateway::prelude::*;
//! use std::io::Cursor;
//!
//! # #[tokio::main]
//! # async fn main() -> GatewayResult<()> {
//! // 1. Connect a store and build the adapter
//! let store = blob_gateway::S3ObjectStore::from_env().await?;
//! let adapter = StorageAdapter::new(store, GatewayConfig::default());
//!
//! // 2. Upload a file; the key is generated, the name is only a hint
//! let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
//! let mut request = UploadRequest::new("photo.png", Cursor::new(png.to_vec()));
//! let stored = adapter.upload_one("my-photos", &mut request).await?;
//!
//! // 3. Hand out a short-lived link
//! let link = adapter.presigned_url("my-photos", &stored.key).await?;
//! println!("{}", link.url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Your front end  │  ← HTTP/gRPC/CLI, out of scope here
//! ├──────────────────┤
//! │  StorageAdapter  │  ← validation, naming, timeouts, fan-out
//! ├──────────────────┤
//! │   ObjectStore    │  ← backend wire protocol (S3, memory)
//! └──────────────────┘
//! ```
//!
//! The adapter never retries: backend failures come back as distinct error
//! kinds ([`GatewayError`]) and retry policy stays with the caller, which
//! is safe because every upload attempt generates a fresh key.

mod adapter;
pub mod bucket;
mod config;
mod error;
mod keys;
pub mod listing;
mod memory_store;
mod s3_store;
pub mod sniff;
pub mod store;
mod types;

// Re-export main types for clean API
pub use adapter::StorageAdapter;
pub use bucket::validate_bucket_name;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use keys::{KeyStrategy, TimeOrderedKeyStrategy};
pub use listing::{filter_by_extension, human_size, stream_objects};
pub use memory_store::MemoryObjectStore;
pub use s3_store::{S3ObjectStore, S3StoreConfig};
pub use sniff::{classify, MediaType, SNIFF_WINDOW};
pub use store::{
    BucketStats, GetOutcome, ListPage, ObjectStore, ObjectSummary, PutOutcome,
};
pub use types::{ByteStream, PresignedUrl, StoredObject, UploadRequest, UploadSource};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        GatewayConfig, GatewayError, GatewayResult, ListPage, MediaType, ObjectStore,
        PresignedUrl, StorageAdapter, StoredObject, UploadRequest,
    };
}
