use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    FallbackPort,
    RawBucket,
    ProcessedBucket,
    StorageEndpoint,
    StorageRegion,
    StorageAccessKey,
    StorageSecretKey,
    LocalRawDir,
    LocalProcessedDir,
    StagingNamespaced,
    FfmpegPath,
    FfprobePath,
    VerifyOutput,
    TransferTimeoutSecs,
    TranscodeTimeoutSecs,
    RetryMaxAttempts,
    RetryInitialBackoffMs,
    RetryBackoffMultiplier,
    RetryMaxBackoffMs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::FallbackPort => "PORT",
            EnvKey::RawBucket => "RAW_VIDEO_BUCKET",
            EnvKey::ProcessedBucket => "PROCESSED_VIDEO_BUCKET",
            EnvKey::StorageEndpoint => "STORAGE_ENDPOINT",
            EnvKey::StorageRegion => "STORAGE_REGION",
            EnvKey::StorageAccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::StorageSecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::LocalRawDir => "LOCAL_RAW_VIDEO_DIR",
            EnvKey::LocalProcessedDir => "LOCAL_PROCESSED_VIDEO_DIR",
            EnvKey::StagingNamespaced => "STAGING_NAMESPACED",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::VerifyOutput => "VERIFY_OUTPUT",
            EnvKey::TransferTimeoutSecs => "TRANSFER_TIMEOUT_SECS",
            EnvKey::TranscodeTimeoutSecs => "TRANSCODE_TIMEOUT_SECS",
            EnvKey::RetryMaxAttempts => "RETRY_MAX_ATTEMPTS",
            EnvKey::RetryInitialBackoffMs => "RETRY_INITIAL_BACKOFF_MS",
            EnvKey::RetryBackoffMultiplier => "RETRY_BACKOFF_MULTIPLIER",
            EnvKey::RetryMaxBackoffMs => "RETRY_MAX_BACKOFF_MS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_optional(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Accepts `1/0`, `true/false`, `yes/no` and `on/off`.
pub fn get_flag(key: EnvKey, default: bool) -> bool {
    match get(key) {
        Ok(val) => parse_flag(&val).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
