use super::{QueueError, QueueStore, QueuedSubmission};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory queue store
#[derive(Default)]
pub struct MemoryQueueStore {
    entries: RwLock<Vec<QueuedSubmission>>,
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn load(&self) -> Result<Vec<QueuedSubmission>, QueueError> {
        Ok(self.entries.read().await.clone())
    }

    async fn save(&self, entries: &[QueuedSubmission]) -> Result<(), QueueError> {
        *self.entries.write().await = entries.to_vec();
        Ok(())
    }
}
