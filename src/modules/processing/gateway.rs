use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::model::{BucketRole, StagingRole};
use super::workspace::Workspace;
use crate::infrastructure::storage::{BlobStore, GatewayError, GatewayResult};

/// Moves artifacts between the remote buckets and the local workspace.
/// Single attempt per call; retries are the orchestrator's concern.
#[derive(Clone)]
pub struct ArtifactGateway {
    store: Arc<dyn BlobStore>,
    workspace: Workspace,
    raw_bucket: String,
    processed_bucket: String,
}

impl ArtifactGateway {
    pub fn new(
        store: Arc<dyn BlobStore>,
        workspace: Workspace,
        raw_bucket: impl Into<String>,
        processed_bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            workspace,
            raw_bucket: raw_bucket.into(),
            processed_bucket: processed_bucket.into(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn bucket(&self, role: BucketRole) -> &str {
        match role {
            BucketRole::RawInbox => &self.raw_bucket,
            BucketRole::ProcessedOutbox => &self.processed_bucket,
        }
    }

    /// Fetch `key` from the raw inbox into raw staging as `local_name`.
    pub async fn download(&self, key: &str, local_name: &str) -> GatewayResult<PathBuf> {
        let dest = self.workspace.resolve_path(StagingRole::Raw, local_name);
        self.store.fetch_to_file(&self.raw_bucket, key, &dest).await?;

        info!(
            "{}/{} downloaded to {}",
            self.raw_bucket,
            key,
            dest.display()
        );
        Ok(dest)
    }

    pub async fn upload(&self, local_path: &Path, key: &str) -> GatewayResult<()> {
        let content_type = mime_guess::from_path(key).first_or_octet_stream().to_string();

        self.store
            .put_from_file(&self.processed_bucket, key, local_path, &content_type)
            .await?;

        info!(
            "{} uploaded to {}/{}",
            local_path.display(),
            self.processed_bucket,
            key
        );
        Ok(())
    }

    pub async fn make_public(&self, key: &str) -> GatewayResult<()> {
        self.store.make_public(&self.processed_bucket, key).await
    }

    /// Idempotent: an absent key is success.
    pub async fn delete_remote(&self, role: BucketRole, key: &str) -> GatewayResult<()> {
        self.store.delete(self.bucket(role), key).await
    }

    /// Idempotent: an absent file is success.
    pub async fn delete_local(&self, path: &Path) -> GatewayResult<()> {
        self.workspace.delete(path).await.map_err(GatewayError::from)
    }
}
