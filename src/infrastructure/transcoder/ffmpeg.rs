use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{EngineError, EngineResult, TranscodeEngine, VideoDimensions};
use crate::modules::processing::model::ScaleFilter;

/// Lines of encoder stderr kept for the error message.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegEngine {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Resolve both binaries on PATH (or as given).
    pub fn check_binaries(&self) -> EngineResult<(PathBuf, PathBuf)> {
        let ffmpeg = which::which(&self.ffmpeg)
            .map_err(|_| EngineError::BinaryNotFound(self.ffmpeg.clone()))?;
        let ffprobe = which::which(&self.ffprobe)
            .map_err(|_| EngineError::BinaryNotFound(self.ffprobe.clone()))?;
        Ok((ffmpeg, ffprobe))
    }
}

pub fn build_transcode_args(input: &Path, output: &Path, filter: &ScaleFilter) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        filter.to_ffmpeg_arg(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        output.to_string_lossy().to_string(),
    ]
}

async fn collect_stderr_tail(stderr: Option<ChildStderr>) -> Vec<String> {
    let Some(stderr) = stderr else {
        return Vec::new();
    };

    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stderr).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "ffmpeg", "{}", line);
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    tail.into_iter().collect()
}

fn exit_result(status: std::io::Result<ExitStatus>, stderr_tail: Vec<String>) -> EngineResult<()> {
    let status = status?;

    if status.success() {
        return Ok(());
    }

    let message = if stderr_tail.is_empty() {
        "FFmpeg exited with non-zero status".to_string()
    } else {
        stderr_tail.join("\n")
    };

    Err(EngineError::failed(message, status.code()))
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn transcode(&self, input: &Path, output: &Path, filter: &ScaleFilter) -> EngineResult<()> {
        let args = build_transcode_args(input, output, filter);
        debug!("Running FFmpeg: {} {}", self.ffmpeg, args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::BinaryNotFound(self.ffmpeg.clone()),
                _ => EngineError::Spawn(e),
            })?;

        let stderr_task = tokio::spawn(collect_stderr_tail(child.stderr.take()));
        let (mut tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            tokio::select! {
                _ = tx.closed() => {
                    warn!("Transcode abandoned by caller, killing FFmpeg");
                    let _ = child.kill().await;
                }
                status = child.wait() => {
                    let tail = stderr_task.await.unwrap_or_default();
                    let _ = tx.send(exit_result(status, tail));
                }
            }
        });

        let result = rx.await.map_err(|_| EngineError::Aborted)?;

        if result.is_ok() {
            info!(
                input = %input.display(),
                output = %output.display(),
                filter = %filter.to_ffmpeg_arg(),
                "FFmpeg processing finished"
            );
        }

        result
    }

    async fn probe(&self, path: &Path) -> EngineResult<VideoDimensions> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::BinaryNotFound(self.ffprobe.clone()),
                _ => EngineError::Spawn(e),
            })?;

        if !output.status.success() {
            return Err(EngineError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_probe_output(stdout: &[u8]) -> EngineResult<VideoDimensions> {
    let parsed: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| EngineError::Probe(e.to_string()))?;

    parsed
        .streams
        .into_iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) => Some(VideoDimensions::new(w, h)),
            _ => None,
        })
        .ok_or_else(|| EngineError::Probe("no video stream".to_string()))
}
