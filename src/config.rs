use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};
use crate::sniff::MediaType;

/// Configuration for gateway operations
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Deadline for a single object upload
    pub upload_timeout: Duration,

    /// Deadline for a single object delete
    pub delete_timeout: Duration,

    /// Lifetime of issued presigned URLs. Fixed by policy, never
    /// caller-tunable, so leaked links stay short-lived.
    pub presign_expiry: Duration,

    /// Upper bound any presign expiry is clamped to
    pub max_presign_expiry: Duration,

    /// Media types accepted for upload, decided by content sniffing
    pub allowed_types: Vec<MediaType>,

    /// Absolute max size allowed for a single object (safety guard)
    pub max_object_bytes: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(60),
            delete_timeout: Duration::from_secs(5),
            presign_expiry: Duration::from_secs(15 * 60),
            max_presign_expiry: Duration::from_secs(60 * 60),
            allowed_types: vec![
                MediaType::Jpeg,
                MediaType::Png,
                MediaType::Webp,
                MediaType::Pdf,
            ],
            max_object_bytes: 5 * 1024 * 1024 * 1024, // 5GB
        }
    }
}

impl GatewayConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upload deadline
    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    /// Set the delete deadline
    pub fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    /// Set the presigned URL lifetime (clamped to `max_presign_expiry`)
    pub fn with_presign_expiry(mut self, expiry: Duration) -> Self {
        self.presign_expiry = expiry;
        self
    }

    /// Replace the media-type allow-list
    pub fn with_allowed_types(mut self, types: Vec<MediaType>) -> Self {
        self.allowed_types = types;
        self
    }

    /// Set max object size
    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = bytes;
        self
    }

    /// Check a sniffed media type against the allow-list.
    ///
    /// The same error comes back for spoofed and genuinely unsupported
    /// content; callers learn nothing about detection internals.
    pub fn ensure_allowed(&self, media: MediaType) -> GatewayResult<()> {
        if self.allowed_types.contains(&media) {
            Ok(())
        } else {
            Err(GatewayError::UnsupportedMediaType)
        }
    }

    /// Presign expiry after applying the policy cap
    pub fn effective_presign_expiry(&self) -> Duration {
        self.presign_expiry.min(self.max_presign_expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allow_list_rejects_unknown() {
        let config = GatewayConfig::default();
        assert!(config.ensure_allowed(MediaType::Png).is_ok());
        assert!(config.ensure_allowed(MediaType::Unknown).is_err());
        assert!(config.ensure_allowed(MediaType::Gif).is_err());
    }

    #[test]
    fn presign_expiry_is_capped() {
        let config = GatewayConfig::default().with_presign_expiry(Duration::from_secs(86_400));
        assert_eq!(config.effective_presign_expiry(), config.max_presign_expiry);
    }
}
