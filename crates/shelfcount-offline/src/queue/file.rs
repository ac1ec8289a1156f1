use super::{QueueError, QueueStore, QueuedSubmission};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Queue persisted as a JSON array. Saves go through a temporary file and a rename so an
/// interrupted write never truncates the queue.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn load(&self) -> Result<Vec<QueuedSubmission>, QueueError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &[QueuedSubmission]) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Request;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_order_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("queue.json");

        let first = QueuedSubmission::new(Request::get("/submit_stock?1"));
        let second = QueuedSubmission::new(Request::get("/submit_stock?2"));
        FileQueueStore::new(&path)
            .save(&[first.clone(), second.clone()])
            .await
            .unwrap();

        let loaded = FileQueueStore::new(&path).load().await.unwrap();
        assert_eq!(loaded, vec![first, second]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_queue() {
        let dir = tempdir().unwrap();
        let store = FileQueueStore::new(dir.path().join("queue.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = FileQueueStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, QueueError::Corrupt(_)));
    }
}
