use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

use crate::common::response::ApiError;
use crate::infrastructure::storage::GatewayError;
use crate::infrastructure::transcoder::EngineError;

pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Download failed: {0}")]
    Download(#[source] GatewayError),

    #[error("Transcode failed: {0}")]
    Transcode(#[from] EngineError),

    #[error("Upload failed: {0}")]
    Upload(#[source] GatewayError),

    #[error("Publish failed: {0}")]
    Publish(#[source] GatewayError),
}

impl ProcessingError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ProcessingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to a caller; never carries store detail.
    pub fn public_message(&self) -> String {
        match self {
            ProcessingError::InvalidRequest(msg) => format!("Invalid data: {}", msg),
            _ => "Error processing video".to_string(),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            ProcessingError::InvalidRequest(_) => "validate",
            ProcessingError::Download(_) => "download",
            ProcessingError::Transcode(_) => "transcode",
            ProcessingError::Upload(_) => "upload",
            ProcessingError::Publish(_) => "publish",
        }
    }
}

impl From<&ProcessingError> for ApiError {
    fn from(err: &ProcessingError) -> Self {
        ApiError(err.public_message(), err.status_code())
    }
}

/// What a failed cleanup step was trying to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTarget {
    Local(PathBuf),
    Remote { bucket: String, key: String },
}

impl std::fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupTarget::Local(path) => write!(f, "{}", path.display()),
            CleanupTarget::Remote { bucket, key } => write!(f, "{}/{}", bucket, key),
        }
    }
}

/// A cleanup step that failed. Logged, never surfaced to the caller.
#[derive(Debug, Error)]
#[error("Cleanup of {target} failed: {source}")]
pub struct CleanupError {
    pub target: CleanupTarget,
    #[source]
    pub source: GatewayError,
}
