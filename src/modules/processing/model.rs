use std::fmt;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::ProcessingError;

/// Output height of the single rendition this service produces.
pub const TARGET_HEIGHT: u32 = 360;

pub const RECOGNIZED_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum JobStatus {
    Received,
    Staged,
    Transcoding,
    Transcoded,
    Published,
    Failed,
    CleanedUp,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Received => "received",
            JobStatus::Staged => "staged",
            JobStatus::Transcoding => "transcoding",
            JobStatus::Transcoded => "transcoded",
            JobStatus::Published => "published",
            JobStatus::Failed => "failed",
            JobStatus::CleanedUp => "cleaned_up",
        }
    }

    /// Linear pipeline plus a failure edge from every non-terminal stage.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (self, next),
            (Received, Staged)
                | (Staged, Transcoding)
                | (Transcoding, Transcoded)
                | (Transcoded, Published)
                | (Published, CleanedUp)
                | (Received | Staged | Transcoding | Transcoded, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::CleanedUp)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a local artifact lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingRole {
    Raw,
    Processed,
}

/// Logical remote bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketRole {
    RawInbox,
    ProcessedOutbox,
}

impl fmt::Display for BucketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketRole::RawInbox => f.write_str("raw-inbox"),
            BucketRole::ProcessedOutbox => f.write_str("processed-outbox"),
        }
    }
}

/// Scale filter applied by the transcode engine. `None` width means
/// "derive from height and keep the aspect ratio".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFilter {
    pub width: Option<u32>,
    pub height: u32,
}

impl ScaleFilter {
    pub fn height(height: u32) -> Self {
        Self {
            width: None,
            height,
        }
    }

    /// FFmpeg `-vf` argument. `-2` keeps the aspect ratio and rounds the
    /// width to an even number, which H.264 requires.
    pub fn to_ffmpeg_arg(&self) -> String {
        match self.width {
            Some(width) => format!("scale={}:{}", width, self.height),
            None => format!("scale=-2:{}", self.height),
        }
    }

    pub fn resolution_tag(&self) -> String {
        format!("{}p", self.height)
    }
}

impl Default for ScaleFilter {
    fn default() -> Self {
        Self::height(TARGET_HEIGHT)
    }
}

/// Validate a raw video name and return `(stem, extension)`.
pub fn split_media_name(name: &str) -> Result<(&str, &str), ProcessingError> {
    if name.trim().is_empty() {
        return Err(ProcessingError::invalid_request("video name is required"));
    }

    // The name is the remote key; it is never rewritten.
    if name.trim() != name {
        return Err(ProcessingError::invalid_request(format!(
            "video name has surrounding whitespace: {:?}",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ProcessingError::invalid_request(format!(
            "video name must be a plain file name: {}",
            name
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(ProcessingError::invalid_request(
            "video name contains control characters",
        ));
    }

    let (stem, extension) = name.rsplit_once('.').ok_or_else(|| {
        ProcessingError::invalid_request(format!("video name has no extension: {}", name))
    })?;

    if stem.is_empty() {
        return Err(ProcessingError::invalid_request(format!(
            "video name has an empty stem: {}",
            name
        )));
    }

    let recognized = RECOGNIZED_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension));

    if !recognized {
        return Err(ProcessingError::invalid_request(format!(
            "unsupported media extension: .{}",
            extension
        )));
    }

    Ok((stem, extension))
}

/// `clip.mp4` becomes `clip-360p.mp4`.
pub fn derive_target_key(source_key: &str, filter: &ScaleFilter) -> Result<String, ProcessingError> {
    let (stem, extension) = split_media_name(source_key)?;
    Ok(format!("{}-{}.{}", stem, filter.resolution_tag(), extension))
}

/// One orchestration run. Never persisted.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub source_key: String,
    pub target_key: String,
    pub raw_staging_name: String,
    pub processed_staging_name: String,
    status: JobStatus,
}

impl Job {
    /// Validate `raw_video_name` and derive everything the pipeline needs.
    /// Performs no I/O.
    pub fn accept(
        raw_video_name: &str,
        filter: &ScaleFilter,
        staging_name: impl Fn(Uuid, &str) -> String,
    ) -> Result<Self, ProcessingError> {
        let source_key = raw_video_name.to_string();
        let target_key = derive_target_key(&source_key, filter)?;
        let id = Uuid::new_v4();

        let job = Self {
            id,
            raw_staging_name: staging_name(id, &source_key),
            processed_staging_name: staging_name(id, &target_key),
            source_key,
            target_key,
            status: JobStatus::Received,
        };

        info!(
            job_id = %job.id,
            source_key = %job.source_key,
            target_key = %job.target_key,
            status = %job.status,
            "Job received"
        );

        Ok(job)
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn advance(&mut self, next: JobStatus) {
        debug_assert!(
            self.status.can_advance_to(next),
            "illegal job transition {} -> {}",
            self.status,
            next
        );

        info!(
            job_id = %self.id,
            from = %self.status,
            to = %next,
            "Job status changed"
        );
        self.status = next;
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessedVideo {
    pub job_id: Uuid,
    pub source_key: String,
    pub target_key: String,
}

impl From<&Job> for ProcessedVideo {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            source_key: job.source_key.clone(),
            target_key: job.target_key.clone(),
        }
    }
}
