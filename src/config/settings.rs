use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::env::{self, EnvKey};
use crate::modules::processing::retry::RetryPolicy;

pub const DEFAULT_RAW_BUCKET: &str = "a-villa-raw-videos";
pub const DEFAULT_PROCESSED_BUCKET: &str = "a-villa-processed-videos";
pub const DEFAULT_RAW_DIR: &str = "./raw-videos";
pub const DEFAULT_PROCESSED_DIR: &str = "./processed-videos";

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub raw_bucket: String,
    pub processed_bucket: String,
    pub storage_endpoint: Option<String>,
    pub storage_region: String,
    pub storage_access_key: String,
    pub storage_secret_key: String,
    pub local_raw_dir: PathBuf,
    pub local_processed_dir: PathBuf,
    pub staging_namespaced: bool,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub verify_output: bool,
    pub transfer_timeout_secs: u64,
    pub transcode_timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_backoff_multiplier: f64,
    pub retry_max_backoff_ms: u64,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        let fallback_port = env::get_parsed(EnvKey::FallbackPort, 3000);

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, fallback_port),
            raw_bucket: env::get_or(EnvKey::RawBucket, DEFAULT_RAW_BUCKET),
            processed_bucket: env::get_or(EnvKey::ProcessedBucket, DEFAULT_PROCESSED_BUCKET),
            storage_endpoint: env::get_optional(EnvKey::StorageEndpoint),
            storage_region: env::get_or(EnvKey::StorageRegion, "us-east-1"),
            storage_access_key: env::get(EnvKey::StorageAccessKey)?,
            storage_secret_key: env::get(EnvKey::StorageSecretKey)?,
            local_raw_dir: PathBuf::from(env::get_or(EnvKey::LocalRawDir, DEFAULT_RAW_DIR)),
            local_processed_dir: PathBuf::from(env::get_or(
                EnvKey::LocalProcessedDir,
                DEFAULT_PROCESSED_DIR,
            )),
            staging_namespaced: env::get_flag(EnvKey::StagingNamespaced, true),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            verify_output: env::get_flag(EnvKey::VerifyOutput, true),
            transfer_timeout_secs: env::get_parsed(EnvKey::TransferTimeoutSecs, 300),
            transcode_timeout_secs: env::get_parsed(EnvKey::TranscodeTimeoutSecs, 1800),
            retry_max_attempts: env::get_parsed(EnvKey::RetryMaxAttempts, 1),
            retry_initial_backoff_ms: env::get_parsed(EnvKey::RetryInitialBackoffMs, 500),
            retry_backoff_multiplier: env::get_parsed(EnvKey::RetryBackoffMultiplier, 2.0),
            retry_max_backoff_ms: env::get_parsed(EnvKey::RetryMaxBackoffMs, 10_000),
        })
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_initial_backoff_ms),
            self.retry_backoff_multiplier,
            Duration::from_millis(self.retry_max_backoff_ms),
        )
    }
}
