use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join4;
use tracing::{error, info, warn};

use super::error::{CleanupError, CleanupTarget, ProcessingError, ProcessingResult};
use super::gateway::ArtifactGateway;
use super::model::{BucketRole, Job, JobStatus, ProcessedVideo, ScaleFilter, StagingRole};
use super::retry::RetryPolicy;
use crate::config::settings::AppConfig;
use crate::infrastructure::storage::GatewayResult;
use crate::infrastructure::transcoder::{EngineError, EngineResult, TranscodeEngine};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub filter: ScaleFilter,
    pub retry: RetryPolicy,
    pub transfer_timeout: Duration,
    pub transcode_timeout: Duration,
    pub verify_output: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            filter: ScaleFilter::default(),
            retry: RetryPolicy::default(),
            transfer_timeout: Duration::from_secs(300),
            transcode_timeout: Duration::from_secs(1800),
            verify_output: true,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            filter: ScaleFilter::default(),
            retry: config.retry_policy(),
            transfer_timeout: config.transfer_timeout(),
            transcode_timeout: config.transcode_timeout(),
            verify_output: config.verify_output,
        }
    }
}

/// Remote side effects that compensation has to undo beyond the fixed set.
#[derive(Debug, Default)]
struct StageEffects {
    uploaded: bool,
}

/// Runs one job: validate, download, transcode, upload, publish, clean up.
#[derive(Clone)]
pub struct JobOrchestrator {
    gateway: ArtifactGateway,
    engine: Arc<dyn TranscodeEngine>,
    settings: PipelineSettings,
}

impl JobOrchestrator {
    pub fn new(
        gateway: ArtifactGateway,
        engine: Arc<dyn TranscodeEngine>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            gateway,
            engine,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn process_job(&self, raw_video_name: &str) -> ProcessingResult<ProcessedVideo> {
        let workspace = self.gateway.workspace();
        let mut job = Job::accept(raw_video_name, &self.settings.filter, |id, name| {
            workspace.staging_name(id, name)
        })?;

        let mut effects = StageEffects::default();

        match self.run_stages(&mut job, &mut effects).await {
            Ok(()) => {
                self.cleanup(&job, false).await;
                job.advance(JobStatus::CleanedUp);

                info!(
                    job_id = %job.id,
                    source_key = %job.source_key,
                    target_key = %job.target_key,
                    "Video processed successfully"
                );
                Ok(ProcessedVideo::from(&job))
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    stage = e.stage(),
                    error = %e,
                    "Error processing video"
                );
                job.advance(JobStatus::Failed);
                self.cleanup(&job, effects.uploaded).await;
                Err(e)
            }
        }
    }

    async fn run_stages(&self, job: &mut Job, effects: &mut StageEffects) -> ProcessingResult<()> {
        let gateway = &self.gateway;
        let retry = &self.settings.retry;
        let transfer_timeout = self.settings.transfer_timeout;

        let raw_path = retry
            .run("download", transfer_timeout, || {
                gateway.download(&job.source_key, &job.raw_staging_name)
            })
            .await
            .map_err(ProcessingError::Download)?;
        job.advance(JobStatus::Staged);

        job.advance(JobStatus::Transcoding);
        let processed_path = self.transcode(job, &raw_path).await?;
        job.advance(JobStatus::Transcoded);

        retry
            .run("upload", transfer_timeout, || {
                gateway.upload(&processed_path, &job.target_key)
            })
            .await
            .map_err(ProcessingError::Upload)?;
        // From here on the outbox object under `target_key` is ours.
        effects.uploaded = true;

        retry
            .run("make_public", transfer_timeout, || {
                gateway.make_public(&job.target_key)
            })
            .await
            .map_err(ProcessingError::Publish)?;
        job.advance(JobStatus::Published);

        Ok(())
    }

    async fn transcode(&self, job: &Job, raw_path: &Path) -> ProcessingResult<PathBuf> {
        let filter = &self.settings.filter;
        let processed_path = self
            .gateway
            .workspace()
            .resolve_path(StagingRole::Processed, &job.processed_staging_name);

        let source = if self.settings.verify_output {
            Some(self.bounded(self.engine.probe(raw_path)).await?)
        } else {
            None
        };

        self.bounded(self.engine.transcode(raw_path, &processed_path, filter))
            .await?;

        if let Some(source) = source {
            let output = self.bounded(self.engine.probe(&processed_path)).await?;

            if !source.matches_scaled(&output, filter) {
                return Err(EngineError::Verification(format!(
                    "expected {}x{} scaled to height {}, got {}x{}",
                    source.width, source.height, filter.height, output.width, output.height
                ))
                .into());
            }

            info!(
                job_id = %job.id,
                source_width = source.width,
                source_height = source.height,
                width = output.width,
                height = output.height,
                "Transcoded output verified"
            );
        }

        Ok(processed_path)
    }

    /// Bound an engine call by the transcode timeout. Dropping the call on
    /// expiry kills the encoder.
    async fn bounded<T>(&self, fut: impl Future<Output = EngineResult<T>>) -> EngineResult<T> {
        let limit = self.settings.transcode_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(EngineError::Timeout(limit.as_secs())))
    }

    /// Remove every artifact the job may have created. Never fails; each
    /// failed step is logged and returned.
    async fn cleanup(&self, job: &Job, remove_processed_remote: bool) -> Vec<CleanupError> {
        let workspace = self.gateway.workspace();
        let raw_path = workspace.resolve_path(StagingRole::Raw, &job.raw_staging_name);
        let processed_path =
            workspace.resolve_path(StagingRole::Processed, &job.processed_staging_name);

        let (local_raw, local_processed, remote_raw, remote_processed) = join4(
            cleanup_step(
                CleanupTarget::Local(raw_path.clone()),
                self.gateway.delete_local(&raw_path),
            ),
            cleanup_step(
                CleanupTarget::Local(processed_path.clone()),
                self.gateway.delete_local(&processed_path),
            ),
            self.delete_remote(BucketRole::RawInbox, &job.source_key),
            async {
                if remove_processed_remote {
                    self.delete_remote(BucketRole::ProcessedOutbox, &job.target_key)
                        .await
                } else {
                    Ok(())
                }
            },
        )
        .await;

        let failures: Vec<CleanupError> = [local_raw, local_processed, remote_raw, remote_processed]
            .into_iter()
            .filter_map(Result::err)
            .collect();

        for failure in &failures {
            warn!(job_id = %job.id, error = %failure, "Cleanup step failed");
        }

        if failures.is_empty() {
            info!(job_id = %job.id, "Job artifacts cleaned up");
        }

        failures
    }

    async fn delete_remote(&self, role: BucketRole, key: &str) -> Result<(), CleanupError> {
        let gateway = &self.gateway;
        let target = CleanupTarget::Remote {
            bucket: gateway.bucket(role).to_string(),
            key: key.to_string(),
        };

        cleanup_step(
            target,
            self.settings
                .retry
                .run("delete", self.settings.transfer_timeout, || {
                    gateway.delete_remote(role, key)
                }),
        )
        .await
    }
}

async fn cleanup_step(
    target: CleanupTarget,
    fut: impl Future<Output = GatewayResult<()>>,
) -> Result<(), CleanupError> {
    fut.await.map_err(|source| CleanupError { target, source })
}
