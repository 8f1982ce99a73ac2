use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_processing_service::app;
use video_processing_service::config::settings::AppConfig;
use video_processing_service::infrastructure::storage::S3BlobStore;
use video_processing_service::infrastructure::transcoder::FfmpegEngine;
use video_processing_service::modules::processing::{
    ArtifactGateway, JobOrchestrator, PipelineSettings, Workspace,
};
use video_processing_service::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting video processing service...");

    let config = AppConfig::new().context("missing storage credentials in environment")?;

    let workspace = Workspace::new(&config.local_raw_dir, &config.local_processed_dir)
        .with_namespacing(config.staging_namespaced);
    workspace
        .ensure_staging_directories()
        .await
        .context("failed to create staging directories")?;

    let engine = FfmpegEngine::new(&config.ffmpeg_path, &config.ffprobe_path);
    match engine.check_binaries() {
        Ok((ffmpeg, ffprobe)) => info!(
            ffmpeg = %ffmpeg.display(),
            ffprobe = %ffprobe.display(),
            "Encoder binaries found"
        ),
        Err(e) => warn!("{}; jobs will fail until it is installed", e),
    }

    let store = Arc::new(S3BlobStore::from_config(&config));
    let gateway = ArtifactGateway::new(
        store,
        workspace,
        &config.raw_bucket,
        &config.processed_bucket,
    );
    let orchestrator = JobOrchestrator::new(
        gateway,
        Arc::new(engine),
        PipelineSettings::from_config(&config),
    );

    let app = app::create_app(AppState::new(orchestrator));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("App listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
