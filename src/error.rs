use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid bucket name `{name}`: {reason}")]
    InvalidBucketName { name: String, reason: String },

    /// Deliberately carries no detail about what the content looked like.
    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("bucket `{bucket}` already exists")]
    BucketAlreadyExists { bucket: String },

    #[error("bucket `{bucket}` not found")]
    BucketNotFound { bucket: String },

    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },

    #[error("operation `{operation}` exceeded its deadline")]
    OperationTimeout { operation: String },

    #[error("storage backend unreachable during `{operation}`: {source}")]
    BackendUnavailable {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upload source does not support seeking back to start")]
    UnseekableSource,

    #[error("invalid request: {message}")]
    Invalid { message: String },

    #[error("storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create a backend-unreachable error with the failing operation attached
    pub fn unavailable<E>(operation: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BackendUnavailable {
            operation: operation.into(),
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an invalid bucket name error with the rule that was violated
    pub fn invalid_bucket<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        Self::InvalidBucketName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a bucket not found error
    pub fn bucket_not_found<S: Into<String>>(bucket: S) -> Self {
        Self::BucketNotFound {
            bucket: bucket.into(),
        }
    }

    /// Create a bucket conflict error
    pub fn bucket_already_exists<S: Into<String>>(bucket: S) -> Self {
        Self::BucketAlreadyExists {
            bucket: bucket.into(),
        }
    }

    /// Create an object not found error
    pub fn object_not_found<B: Into<String>, K: Into<String>>(bucket: B, key: K) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create a deadline-exceeded error for the named operation
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::OperationTimeout {
            operation: operation.into(),
        }
    }
}
