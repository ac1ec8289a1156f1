//! Client worker
//!
//! Process-scoped owner of the cache generation and the submission queue. Lifecycle
//! events arrive through the `on_*` hooks; nothing here is global.

use crate::cache::{
    CacheError, CacheLifecycle, CacheStatus, CacheStore, FetchSource, OfflineCacheManager,
    ServedResponse, DEFAULT_MANIFEST,
};
use crate::net::{Network, NetworkError, Request};
use crate::queue::{
    DeferredSubmissionQueue, QueueError, QueueStore, QueuedSubmission, ReplayReport,
    SubmitOutcome,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct ClientWorker {
    cache_store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    manifest: Vec<String>,
    queue: DeferredSubmissionQueue,
    installing: Mutex<Option<OfflineCacheManager>>,
    active: RwLock<Option<OfflineCacheManager>>,
}

impl ClientWorker {
    pub fn new(
        cache_store: Arc<dyn CacheStore>,
        queue_store: Arc<dyn QueueStore>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            queue: DeferredSubmissionQueue::new(queue_store, network.clone()),
            cache_store,
            network,
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            installing: Mutex::new(None),
            active: RwLock::new(None),
        }
    }

    pub fn with_manifest(mut self, manifest: Vec<String>) -> Self {
        self.manifest = manifest;
        self
    }

    fn manager(&self, generation: &str) -> OfflineCacheManager {
        OfflineCacheManager::new(self.cache_store.clone(), self.network.clone(), generation)
            .with_manifest(self.manifest.clone())
    }

    /// Pick up a generation an earlier run activated. Returns false unless it finished
    /// installing.
    pub async fn resume(&self, generation: &str) -> Result<bool, CacheError> {
        if !self.cache_store.is_installed(generation).await? {
            return Ok(false);
        }
        *self.active.write().await = Some(self.manager(generation).resume_active());
        tracing::debug!(generation = %generation, "Resumed active cache generation");
        Ok(true)
    }

    /// Pick up a generation an earlier run installed so it can be activated.
    pub async fn adopt_installed(&self, generation: &str) -> Result<bool, CacheError> {
        if !self.cache_store.is_installed(generation).await? {
            tracing::debug!(generation = %generation, "No completed install to adopt");
            return Ok(false);
        }
        *self.installing.lock().await = Some(self.manager(generation).resume_installed());
        Ok(true)
    }

    pub async fn on_install(&self, generation: &str) -> Result<(), CacheError> {
        let mut installing = self.installing.lock().await;
        let mut manager = self.manager(generation);
        manager.install().await?;
        *installing = Some(manager);
        Ok(())
    }

    /// Activate the installed generation and retire the previous one. Returns the
    /// generations that were deleted.
    pub async fn on_activate(&self) -> Result<Vec<String>, CacheError> {
        let mut installing = self.installing.lock().await;
        let mut manager = installing.take().ok_or(CacheError::InvalidTransition {
            state: CacheLifecycle::Installing,
            action: "activate",
        })?;

        let evicted = match manager.activate().await {
            Ok(evicted) => evicted,
            Err(err) => {
                *installing = Some(manager);
                return Err(err);
            }
        };

        let mut active = self.active.write().await;
        if let Some(previous) = active.as_mut() {
            if previous.generation() != manager.generation() {
                previous.supersede();
                tracing::info!(
                    previous = %previous.generation(),
                    current = %manager.generation(),
                    "Cache generation superseded"
                );
            }
        }
        *active = Some(manager);
        Ok(evicted)
    }

    pub async fn on_fetch(&self, request: &Request) -> Result<ServedResponse, NetworkError> {
        if let Some(manager) = self.active.read().await.as_ref() {
            return manager.handle_fetch(request).await;
        }
        let response = self.network.fetch(request).await?;
        Ok(ServedResponse {
            response,
            source: FetchSource::Passthrough,
        })
    }

    /// Connectivity came back: drain the submission queue.
    pub async fn on_reconnect(&self) -> Result<ReplayReport, QueueError> {
        self.queue.replay().await
    }

    pub async fn submit(&self, request: Request) -> Result<SubmitOutcome, QueueError> {
        self.queue.submit(request).await
    }

    pub async fn pending_submissions(&self) -> Result<Vec<QueuedSubmission>, QueueError> {
        self.queue.pending().await
    }

    pub async fn active_generation(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|m| m.generation().to_string())
    }

    pub async fn cache_status(&self) -> Result<Option<CacheStatus>, CacheError> {
        if let Some(manager) = self.active.read().await.as_ref() {
            return manager.status().await.map(Some);
        }
        match self.installing.lock().await.as_ref() {
            Some(manager) => manager.status().await.map(Some),
            None => Ok(None),
        }
    }
}
