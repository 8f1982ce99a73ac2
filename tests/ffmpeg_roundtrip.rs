use tempfile::TempDir;
use tokio::process::Command;

use video_processing_service::infrastructure::transcoder::{
    EngineError, FfmpegEngine, TranscodeEngine, VideoDimensions,
};
use video_processing_service::modules::processing::model::ScaleFilter;

fn encoder_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

#[tokio::test]
async fn test_transcode_scales_to_360p() {
    if !encoder_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("fixture.mp4");
    let output = dir.path().join("fixture-360p.mp4");

    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg("testsrc=size=640x480:duration=1:rate=10")
        .args(["-pix_fmt", "yuv420p"])
        .arg(&input)
        .status()
        .await
        .unwrap();
    assert!(status.success());

    let engine = FfmpegEngine::default();
    engine
        .transcode(&input, &output, &ScaleFilter::default())
        .await
        .unwrap();

    let dimensions = engine.probe(&output).await.unwrap();
    assert_eq!(dimensions, VideoDimensions::new(480, 360));
}

#[tokio::test]
async fn test_transcode_rejects_garbage_input() {
    if !encoder_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("garbage.mp4");
    let output = dir.path().join("garbage-360p.mp4");
    tokio::fs::write(&input, b"definitely not a video").await.unwrap();

    let err = FfmpegEngine::default()
        .transcode(&input, &output, &ScaleFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Failed { .. }));
}
