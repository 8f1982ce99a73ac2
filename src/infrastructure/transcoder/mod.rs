//! Media encoder abstraction.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modules::processing::model::ScaleFilter;

pub mod ffmpeg;

pub use ffmpeg::FfmpegEngine;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Encoder binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Failed to start encoder: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Encoder failed: {message}")]
    Failed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Encoder exited without reporting a result")]
    Aborted,

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Output verification failed: {0}")]
    Verification(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            message: message.into(),
            exit_code,
        }
    }
}

/// Pixel size of the first video stream of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Width a source of this size should get when scaled to `height`, rounded
    /// to the nearest even number.
    pub fn scaled_width(&self, height: u32) -> u32 {
        if self.height == 0 {
            return 0;
        }
        let exact = self.width as f64 * height as f64 / self.height as f64;
        ((exact / 2.0).round() as u32) * 2
    }

    /// Whether `output` is this size scaled to `filter`, allowing two pixels of
    /// rounding on the derived side.
    pub fn matches_scaled(&self, output: &VideoDimensions, filter: &ScaleFilter) -> bool {
        if output.height != filter.height {
            return false;
        }
        let expected = filter
            .width
            .unwrap_or_else(|| self.scaled_width(filter.height));
        output.width.abs_diff(expected) <= 2
    }
}

/// Streaming encoder. `transcode` resolves exactly once; partial output from a
/// failed run is left for the caller to remove.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path, filter: &ScaleFilter) -> EngineResult<()>;

    async fn probe(&self, path: &Path) -> EngineResult<VideoDimensions>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_width_keeps_aspect() {
        assert_eq!(VideoDimensions::new(1920, 1080).scaled_width(360), 640);
        assert_eq!(VideoDimensions::new(640, 480).scaled_width(360), 480);
        // 1080x1920 portrait: 202.5 rounds to the even 202
        assert_eq!(VideoDimensions::new(1080, 1920).scaled_width(360), 202);
    }

    #[test]
    fn test_matches_scaled() {
        let filter = ScaleFilter::default();
        let source = VideoDimensions::new(1280, 720);

        assert!(source.matches_scaled(&VideoDimensions::new(640, 360), &filter));
        assert!(source.matches_scaled(&VideoDimensions::new(642, 360), &filter));
        assert!(!source.matches_scaled(&VideoDimensions::new(640, 480), &filter));
        assert!(!source.matches_scaled(&VideoDimensions::new(480, 360), &filter));
    }

    #[test]
    fn test_aspect_ratio() {
        let dims = VideoDimensions::new(640, 360);
        assert!((dims.aspect_ratio() - 16.0 / 9.0).abs() < 0.01);
        assert_eq!(VideoDimensions::new(10, 0).aspect_ratio(), 0.0);
    }
}
