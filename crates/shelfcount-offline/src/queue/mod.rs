//! Deferred submission queue
//!
//! Submissions that cannot reach the server are persisted and replayed in FIFO order on
//! the next reconnect. An entry leaves the queue only once the server acknowledged its
//! replay with a 2xx; a failed replay stops the drain so later entries never overtake it.

mod file;
mod memory;

pub use file::FileQueueStore;
pub use memory::MemoryQueueStore;

use crate::net::{Network, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSubmission {
    pub id: Uuid,
    pub request: Request,
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl QueuedSubmission {
    pub fn new(request: Request) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            queued_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }
}

/// Durable storage for the queue contents, in order.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn load(&self) -> Result<Vec<QueuedSubmission>, QueueError>;

    async fn save(&self, entries: &[QueuedSubmission]) -> Result<(), QueueError>;
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Reached the server; the response may still be an error status.
    Sent(Response),
    Queued(QueuedSubmission),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub replayed: usize,
    pub remaining: usize,
    /// Head entry that failed this round, with the reason
    pub blocked: Option<(Uuid, String)>,
}

pub struct DeferredSubmissionQueue {
    store: Arc<dyn QueueStore>,
    network: Arc<dyn Network>,
    // Serializes read-modify-write of the store.
    guard: Mutex<()>,
}

impl DeferredSubmissionQueue {
    pub fn new(store: Arc<dyn QueueStore>, network: Arc<dyn Network>) -> Self {
        Self {
            store,
            network,
            guard: Mutex::new(()),
        }
    }

    pub async fn enqueue(&self, request: Request) -> Result<QueuedSubmission, QueueError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.store.load().await?;
        self.append(&mut entries, request).await
    }

    async fn append(
        &self,
        entries: &mut Vec<QueuedSubmission>,
        request: Request,
    ) -> Result<QueuedSubmission, QueueError> {
        let entry = QueuedSubmission::new(request);
        entries.push(entry.clone());
        self.store.save(entries).await?;
        tracing::info!(id = %entry.id, url = %entry.request.url, pending = entries.len(), "Submission queued");
        Ok(entry)
    }

    /// Send now, or queue when the network cannot be reached.
    ///
    /// Older queued entries go first. If any of them is still pending after that, the new
    /// submission is queued behind them instead of being sent.
    pub async fn submit(&self, request: Request) -> Result<SubmitOutcome, QueueError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.store.load().await?;

        if !entries.is_empty() {
            let report = self.drain(&mut entries).await?;
            if report.remaining > 0 {
                tracing::info!(
                    url = %request.url,
                    ahead = report.remaining,
                    "Earlier submissions still pending, queueing behind them"
                );
                return Ok(SubmitOutcome::Queued(self.append(&mut entries, request).await?));
            }
        }

        match self.network.fetch(&request).await {
            Ok(response) => Ok(SubmitOutcome::Sent(response)),
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "Submission deferred");
                Ok(SubmitOutcome::Queued(self.append(&mut entries, request).await?))
            }
        }
    }

    pub async fn pending(&self) -> Result<Vec<QueuedSubmission>, QueueError> {
        self.store.load().await
    }

    /// Drain the queue in order until it is empty or an entry fails.
    pub async fn replay(&self) -> Result<ReplayReport, QueueError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.store.load().await?;
        self.drain(&mut entries).await
    }

    async fn drain(&self, entries: &mut Vec<QueuedSubmission>) -> Result<ReplayReport, QueueError> {
        let mut report = ReplayReport::default();

        while let Some(head) = entries.first_mut() {
            head.attempts += 1;
            let failure = match self.network.fetch(&head.request).await {
                Ok(response) if response.is_success() => None,
                Ok(response) => Some(format!("server answered {}", response.status)),
                Err(err) => Some(err.to_string()),
            };

            match failure {
                None => {
                    let done = entries.remove(0);
                    self.store.save(entries).await?;
                    report.replayed += 1;
                    tracing::info!(id = %done.id, attempts = done.attempts, "Queued submission replayed");
                }
                Some(reason) => {
                    head.last_error = Some(reason.clone());
                    report.blocked = Some((head.id, reason));
                    self.store.save(entries).await?;
                    break;
                }
            }
        }

        report.remaining = entries.len();
        if let Some((id, reason)) = &report.blocked {
            tracing::warn!(id = %id, reason = %reason, remaining = report.remaining, "Replay stopped");
        }
        Ok(report)
    }
}
