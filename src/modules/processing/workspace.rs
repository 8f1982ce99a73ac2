use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use super::model::StagingRole;

/// Owns the two local staging directories.
#[derive(Debug, Clone)]
pub struct Workspace {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
    namespaced: bool,
}

impl Workspace {
    pub fn new(raw_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
            namespaced: true,
        }
    }

    /// Disable job-id prefixes on staging filenames.
    pub fn with_namespacing(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    pub fn dir(&self, role: StagingRole) -> &Path {
        match role {
            StagingRole::Raw => &self.raw_dir,
            StagingRole::Processed => &self.processed_dir,
        }
    }

    /// Safe to call repeatedly.
    pub async fn ensure_staging_directories(&self) -> std::io::Result<()> {
        for dir in [&self.raw_dir, &self.processed_dir] {
            if fs::try_exists(dir).await.unwrap_or(false) {
                continue;
            }
            fs::create_dir_all(dir).await?;
            info!(path = %dir.display(), "Directory created");
        }
        Ok(())
    }

    pub fn resolve_path(&self, role: StagingRole, filename: &str) -> PathBuf {
        self.dir(role).join(filename)
    }

    pub fn staging_name(&self, job_id: Uuid, filename: &str) -> String {
        if self.namespaced {
            format!("{}-{}", job_id.simple(), filename)
        } else {
            filename.to_string()
        }
    }

    /// Remove a local artifact. A missing file is not an error.
    pub async fn delete(&self, path: &Path) -> std::io::Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "File does not exist");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
