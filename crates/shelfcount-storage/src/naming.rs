use crate::traits::{DocumentStore, StorageError, StorageResult};
use shelfcount_core::models::FolderHandle;
use std::sync::Arc;

/// Upper bound on timestamp bumps when a renamed file also exists.
const MAX_RENAME_ATTEMPTS: i64 = 16;

/// Source of epoch milliseconds for collision suffixes.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// `a.png` at 1700000000000 becomes `a_1700000000000.png`; names without a dot get the
/// suffix appended.
pub fn timestamped_name(desired: &str, millis: i64) -> String {
    match desired.rfind('.') {
        Some(idx) => format!("{}_{}{}", &desired[..idx], millis, &desired[idx..]),
        None => format!("{}_{}", desired, millis),
    }
}

/// Picks a file name that does not clash with an existing entry in a folder.
///
/// The check and the later write are not atomic: two writers choosing the same name at the
/// same moment can still collide.
#[derive(Clone)]
pub struct CollisionSafeNamer {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl CollisionSafeNamer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn resolve_name(&self, folder: &FolderHandle, desired: &str) -> StorageResult<String> {
        if self.store.find_files(folder, desired).await?.is_empty() {
            return Ok(desired.to_string());
        }

        let base_millis = self.clock.now_millis();
        for offset in 0..MAX_RENAME_ATTEMPTS {
            let candidate = timestamped_name(desired, base_millis + offset);
            if self.store.find_files(folder, &candidate).await?.is_empty() {
                tracing::debug!(
                    folder_id = %folder.id,
                    desired = %desired,
                    resolved = %candidate,
                    "Renamed colliding file"
                );
                return Ok(candidate);
            }
        }

        Err(StorageError::InvalidName(format!(
            "No free name for '{}' after {} attempts",
            desired, MAX_RENAME_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_timestamped_name() {
        assert_eq!(timestamped_name("a.png", 1700000000000), "a_1700000000000.png");
        assert_eq!(timestamped_name("photo", 5), "photo_5");
        assert_eq!(timestamped_name("archive.tar.gz", 7), "archive.tar_7.gz");
        assert_eq!(timestamped_name(".hidden", 9), "_9.hidden");
    }

    #[tokio::test]
    async fn test_free_name_is_unchanged() {
        let store = Arc::new(MemoryStore::default());
        let namer = CollisionSafeNamer::new(store.clone());
        let name = namer.resolve_name(&store.root(), "a.png").await.unwrap();
        assert_eq!(name, "a.png");
    }

    #[tokio::test]
    async fn test_collision_appends_timestamp() {
        let store = Arc::new(MemoryStore::default());
        let root = store.root();
        store.create_file(&root, "a.png", "image/png", vec![1]).await.unwrap();

        let namer = CollisionSafeNamer::new(store.clone())
            .with_clock(Arc::new(FixedClock(1_700_000_000_000)));
        let name = namer.resolve_name(&root, "a.png").await.unwrap();
        assert_eq!(name, "a_1700000000000.png");
    }

    #[tokio::test]
    async fn test_renamed_name_also_taken() {
        let store = Arc::new(MemoryStore::default());
        let root = store.root();
        store.create_file(&root, "a.png", "image/png", vec![1]).await.unwrap();
        store
            .create_file(&root, "a_1000.png", "image/png", vec![2])
            .await
            .unwrap();

        let namer = CollisionSafeNamer::new(store.clone()).with_clock(Arc::new(FixedClock(1000)));
        let name = namer.resolve_name(&root, "a.png").await.unwrap();
        assert_eq!(name, "a_1001.png");
    }

    #[tokio::test]
    async fn test_collision_scoped_to_folder() {
        let store = Arc::new(MemoryStore::default());
        let root = store.root();
        let other = store.create_folder(&root, "Other").await.unwrap();
        store.create_file(&other, "a.png", "image/png", vec![1]).await.unwrap();

        let namer = CollisionSafeNamer::new(store.clone());
        assert_eq!(namer.resolve_name(&root, "a.png").await.unwrap(), "a.png");
    }
}
