//! Remote blob store abstraction.
//!
//! The pipeline only needs four primitives from the store: fetch an object
//! into a local file, put a local file, grant public read, and delete. None of
//! them retry; retry policy belongs to the caller.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub mod s3;

pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// A missing object or a rejected ACL will not change on a second try.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transfer(_) | GatewayError::Timeout(_) | GatewayError::Io(_)
        )
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `bucket/key` into `dest`, returning the number of bytes written.
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> GatewayResult<u64>;

    /// Upload the file at `src` to `bucket/key`.
    async fn put_from_file(
        &self,
        bucket: &str,
        key: &str,
        src: &Path,
        content_type: &str,
    ) -> GatewayResult<()>;

    async fn make_public(&self, bucket: &str, key: &str) -> GatewayResult<()>;

    /// Deleting an absent object succeeds.
    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()>;
}
