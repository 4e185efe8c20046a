//! Object storage access for mirrored buckets
//!
//! [`ObjectSource`] is the only seam the fetcher sees. [`S3Source`] talks to S3
//! (or an S3-compatible endpoint) and [`MemorySource`] backs tests and dry runs.
//! Keys are passed through exactly as the notification named them.

pub mod memory;
pub mod s3;

pub use memory::MemorySource;
pub use s3::S3Source;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object store error: {0}")]
    Store(String),
}

impl SourceError {
    pub fn not_found(bucket: &str, key: &str) -> Self {
        SourceError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}

/// Storage result type
pub type Result<T> = std::result::Result<T, SourceError>;

/// Body of a retrieved object, yielded chunk by chunk
pub type ObjectStream = BoxStream<'static, Result<Bytes>>;

/// Read access to objects by bucket and key
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Start retrieving an object.
    ///
    /// A missing object must surface as [`SourceError::NotFound`] so callers can
    /// tell stale notifications apart from real failures.
    async fn open(&self, bucket: &str, key: &str) -> Result<ObjectStream>;
}
