#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Barrier;

use video_processing_service::infrastructure::storage::{BlobStore, GatewayError, GatewayResult};
use video_processing_service::infrastructure::transcoder::{
    EngineError, EngineResult, TranscodeEngine, VideoDimensions,
};
use video_processing_service::modules::processing::model::ScaleFilter;
use video_processing_service::modules::processing::{
    ArtifactGateway, JobOrchestrator, PipelineSettings, Workspace,
};

pub const RAW_BUCKET: &str = "raw-test-bucket";
pub const PROCESSED_BUCKET: &str = "processed-test-bucket";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Fetch,
    Put,
    MakePublic,
    Delete,
}

/// Bucket store kept in memory, with per-operation failure injection.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    public: Mutex<HashSet<(String, String)>>,
    failing: Mutex<HashSet<StoreOp>>,
    calls: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.get(bucket, key).is_some()
    }

    pub fn is_public(&self, bucket: &str, key: &str) -> bool {
        self.public
            .lock()
            .unwrap()
            .contains(&(bucket.to_string(), key.to_string()))
    }

    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: StoreOp) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&op) {
            return Err(match op {
                StoreOp::MakePublic => GatewayError::permission("public access prevention"),
                _ => GatewayError::transfer(format!("injected {:?} failure", op)),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> GatewayResult<u64> {
        self.enter(StoreOp::Fetch)?;
        let data = self
            .get(bucket, key)
            .ok_or_else(|| GatewayError::not_found(key))?;
        tokio::fs::write(dest, &data).await?;
        Ok(data.len() as u64)
    }

    async fn put_from_file(
        &self,
        bucket: &str,
        key: &str,
        src: &Path,
        _content_type: &str,
    ) -> GatewayResult<()> {
        self.enter(StoreOp::Put)?;
        let data = tokio::fs::read(src).await?;
        self.insert(bucket, key, &data);
        Ok(())
    }

    async fn make_public(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        self.enter(StoreOp::MakePublic)?;
        if !self.contains(bucket, key) {
            return Err(GatewayError::not_found(key));
        }
        self.public
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        self.enter(StoreOp::Delete)?;
        let id = (bucket.to_string(), key.to_string());
        self.objects.lock().unwrap().remove(&id);
        self.public.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    Succeed,
    /// Writes partial output, then fails.
    Fail,
    /// Never resolves.
    Hang,
    /// Produces output at the wrong size.
    WrongSize,
}

/// Engine double. Media files hold their own size as text, e.g. `640x480`.
pub struct FakeEngine {
    mode: EngineMode,
    rendezvous: Option<Arc<Barrier>>,
    inputs: Mutex<Vec<(PathBuf, VideoDimensions)>>,
}

impl FakeEngine {
    pub fn new(mode: EngineMode) -> Self {
        Self {
            mode,
            rendezvous: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Hold every transcode, after its output is written, until `parties`
    /// transcodes are in flight together.
    pub fn rendezvous(mut self, parties: usize) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Input path and size of every transcode call, in call order.
    pub fn inputs(&self) -> Vec<(PathBuf, VideoDimensions)> {
        self.inputs.lock().unwrap().clone()
    }
}

fn parse_dimensions(text: &str) -> Option<VideoDimensions> {
    let (width, height) = text.trim().split_once('x')?;
    Some(VideoDimensions::new(width.parse().ok()?, height.parse().ok()?))
}

#[async_trait]
impl TranscodeEngine for FakeEngine {
    async fn transcode(&self, input: &Path, output: &Path, filter: &ScaleFilter) -> EngineResult<()> {
        let source = tokio::fs::read_to_string(input).await?;
        let source = parse_dimensions(&source)
            .ok_or_else(|| EngineError::failed("Invalid data found when processing input", Some(1)))?;
        self.inputs.lock().unwrap().push((input.to_path_buf(), source));

        match self.mode {
            EngineMode::Succeed => {
                let width = source.scaled_width(filter.height);
                tokio::fs::write(output, format!("{}x{}", width, filter.height)).await?;
                if let Some(barrier) = &self.rendezvous {
                    barrier.wait().await;
                }
                Ok(())
            }
            EngineMode::Fail => {
                tokio::fs::write(output, b"partial").await?;
                Err(EngineError::failed("Conversion failed!", Some(1)))
            }
            EngineMode::Hang => {
                tokio::fs::write(output, b"partial").await?;
                std::future::pending::<()>().await;
                Ok(())
            }
            EngineMode::WrongSize => {
                tokio::fs::write(output, format!("{}x{}", source.width, source.height)).await?;
                Ok(())
            }
        }
    }

    async fn probe(&self, path: &Path) -> EngineResult<VideoDimensions> {
        let text = tokio::fs::read_to_string(path).await?;
        parse_dimensions(&text)
            .ok_or_else(|| EngineError::Probe(format!("no video stream in {}", path.display())))
    }
}

/// Orchestrator wired to in-memory doubles and a throwaway workspace.
pub struct Harness {
    pub dir: TempDir,
    pub store: Arc<InMemoryBlobStore>,
    pub engine: Arc<FakeEngine>,
    pub gateway: ArtifactGateway,
    pub orchestrator: JobOrchestrator,
}

impl Harness {
    pub async fn new(mode: EngineMode) -> Self {
        Self::with_store(mode, Arc::new(InMemoryBlobStore::new())).await
    }

    pub async fn with_store(mode: EngineMode, store: Arc<InMemoryBlobStore>) -> Self {
        Self::build(FakeEngine::new(mode), store, true).await
    }

    pub async fn build(engine: FakeEngine, store: Arc<InMemoryBlobStore>, namespaced: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().join("raw"), dir.path().join("processed"))
            .with_namespacing(namespaced);
        workspace.ensure_staging_directories().await.unwrap();
        let engine = Arc::new(engine);

        let gateway = ArtifactGateway::new(store.clone(), workspace, RAW_BUCKET, PROCESSED_BUCKET);
        let settings = PipelineSettings {
            transfer_timeout: Duration::from_secs(5),
            transcode_timeout: Duration::from_millis(500),
            ..PipelineSettings::default()
        };
        let orchestrator = JobOrchestrator::new(gateway.clone(), engine.clone(), settings);

        Self {
            dir,
            store,
            engine,
            gateway,
            orchestrator,
        }
    }

    pub fn seed_raw(&self, key: &str, dimensions: &str) {
        self.store.insert(RAW_BUCKET, key, dimensions.as_bytes());
    }

    /// Both staging directories exist and hold no files.
    pub fn staging_is_empty(&self) -> bool {
        ["raw", "processed"].iter().all(|name| {
            std::fs::read_dir(self.dir.path().join(name))
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false)
        })
    }
}
