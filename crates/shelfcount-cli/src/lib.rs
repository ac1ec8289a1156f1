//! Shared plumbing for the stock-count command-line client: settings, the on-disk state
//! directory and the worker built on top of it.

use anyhow::Context;
use shelfcount_offline::{
    AcquisitionChain, CapturedPhoto, ClientWorker, FileQueueStore, FsCacheStore, HttpNetwork,
    NewestImageInDir, PhotoFile, StockClient, DEFAULT_GENERATION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_STATE_DIR: &str = ".shelfcount";

const ACTIVE_MARKER: &str = "active-generation";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub state_dir: PathBuf,
    pub generation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            generation: DEFAULT_GENERATION.to_string(),
        }
    }
}

impl Settings {
    pub fn cache_dir(&self) -> PathBuf {
        self.state_dir.join("cache")
    }

    pub fn queue_file(&self) -> PathBuf {
        self.state_dir.join("queue.json")
    }

    pub fn marker_file(&self) -> PathBuf {
        self.state_dir.join(ACTIVE_MARKER)
    }
}

/// Generation the last `cache activate` left active, if any.
pub async fn read_active_marker(path: &Path) -> anyhow::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let generation = contents.trim();
            Ok((!generation.is_empty()).then(|| generation.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

pub async fn write_active_marker(path: &Path, generation: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, generation)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Build the worker over the state directory and resume the recorded active generation.
pub async fn open_worker(settings: &Settings) -> anyhow::Result<Arc<ClientWorker>> {
    let cache_store = FsCacheStore::new(settings.cache_dir())
        .await
        .context("Failed to open cache directory")?;
    let queue_store = FileQueueStore::new(settings.queue_file());
    let network = HttpNetwork::new(settings.server_url.clone(), REQUEST_TIMEOUT)?;

    let worker = ClientWorker::new(Arc::new(cache_store), Arc::new(queue_store), Arc::new(network));

    if let Some(generation) = read_active_marker(&settings.marker_file()).await? {
        if !worker.resume(&generation).await? {
            tracing::warn!(generation = %generation, "Recorded cache generation is missing; serving from network");
        }
    }
    Ok(Arc::new(worker))
}

pub async fn open_client(settings: &Settings) -> anyhow::Result<StockClient> {
    Ok(StockClient::new(open_worker(settings).await?))
}

/// Explicit file first, then the newest image in the capture directory.
pub fn photo_chain(photo: Option<PathBuf>, capture_dir: Option<PathBuf>) -> AcquisitionChain<CapturedPhoto> {
    AcquisitionChain::new()
        .then(PhotoFile(photo))
        .then(NewestImageInDir(capture_dir))
}
