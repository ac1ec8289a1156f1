//! Logical path to folder resolution
//!
//! Each segment is looked up under the current folder and created when missing. A folder
//! created on the way is kept even if a later segment fails.
//!
//! Without strict mode two callers resolving the same new prefix at once can both miss the
//! lookup and each create a sibling with the same name. Strict mode serializes resolution
//! per prefix inside this process; it does not coordinate separate processes.

use crate::traits::{DocumentStore, StorageResult};
use shelfcount_core::models::{FolderHandle, LogicalPath};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct PathLocks {
    by_prefix: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PathLocks {
    fn lock_for(&self, prefix: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self
            .by_prefix
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(prefix.to_string()).or_default().clone()
    }
}

/// Walks a [`LogicalPath`] from the storage root, reusing or creating each folder.
#[derive(Clone)]
pub struct PathResolver {
    store: Arc<dyn DocumentStore>,
    locks: Option<Arc<PathLocks>>,
}

impl PathResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, locks: None }
    }

    /// Serialize lookup-then-create per path prefix.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.locks = strict.then(|| Arc::new(PathLocks::default()));
        self
    }

    pub fn is_strict(&self) -> bool {
        self.locks.is_some()
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    #[tracing::instrument(skip(self), fields(path = %path))]
    pub async fn resolve(&self, path: &LogicalPath) -> StorageResult<FolderHandle> {
        let mut current = self.store.root();

        for (depth, segment) in path.segments().iter().enumerate() {
            current = match &self.locks {
                Some(locks) => {
                    let prefix = path.prefix(depth + 1).to_string();
                    let lock = locks.lock_for(&prefix);
                    let _guard = lock.lock().await;
                    self.descend(&current, segment).await?
                }
                None => self.descend(&current, segment).await?,
            };
        }

        Ok(current)
    }

    async fn descend(&self, parent: &FolderHandle, name: &str) -> StorageResult<FolderHandle> {
        let mut existing = self.store.find_folders(parent, name).await?;
        if existing.len() > 1 {
            tracing::warn!(
                parent_id = %parent.id,
                name = %name,
                count = existing.len(),
                "Duplicate sibling folders, using the first"
            );
        }
        if !existing.is_empty() {
            return Ok(existing.swap_remove(0));
        }

        let created = self.store.create_folder(parent, name).await?;
        tracing::debug!(folder_id = %created.id, name = %name, "Created missing folder");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InjectedFailure, MemoryStore, StoreOperation};
    use crate::StorageError;

    fn setup() -> (Arc<MemoryStore>, PathResolver) {
        let store = Arc::new(MemoryStore::default());
        let resolver = PathResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let (store, resolver) = setup();
        let path = LogicalPath::parse("Check Stock Project/ สาขาในเมือง ");

        let first = resolver.resolve(&path).await.unwrap();
        let second = resolver.resolve(&path).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, "สาขาในเมือง");
        assert_eq!(store.folder_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_prefix_is_reused() {
        let (store, resolver) = setup();
        let a = resolver.resolve(&LogicalPath::parse("Project/A")).await.unwrap();
        let b = resolver.resolve(&LogicalPath::parse("Project/B")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.count_folders_named("Project"), 1);
    }

    #[tokio::test]
    async fn test_empty_path_is_root() {
        let (store, resolver) = setup();
        let handle = resolver.resolve(&LogicalPath::parse(" / /")).await.unwrap();
        assert_eq!(handle, store.root());
        assert_eq!(store.folder_count(), 0);
    }

    #[tokio::test]
    async fn test_matching_is_case_sensitive() {
        let (store, resolver) = setup();
        resolver.resolve(&LogicalPath::parse("project")).await.unwrap();
        resolver.resolve(&LogicalPath::parse("Project")).await.unwrap();
        assert_eq!(store.folder_count(), 2);
    }

    #[tokio::test]
    async fn test_created_ancestors_survive_later_failure() {
        let (store, resolver) = setup();
        store.deny_folder_creation("Locked");

        let err = resolver
            .resolve(&LogicalPath::parse("Project/Locked"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PermissionDenied(_)));
        assert_eq!(store.count_folders_named("Project"), 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let (store, resolver) = setup();
        store.inject_failure(StoreOperation::FindFolders, InjectedFailure::Unavailable);
        let err = resolver.resolve(&LogicalPath::parse("A")).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_strict_mode_prevents_duplicate_siblings() {
        let store = Arc::new(MemoryStore::default());
        let resolver = PathResolver::new(store.clone()).with_strict(true);
        let path = LogicalPath::parse("Project/Branch");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                let path = path.clone();
                tokio::spawn(async move { resolver.resolve(&path).await })
            })
            .collect();
        let handles: Vec<FolderHandle> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert!(handles.iter().all(|h| h.id == handles[0].id));
        assert_eq!(store.count_folders_named("Project"), 1);
        assert_eq!(store.count_folders_named("Branch"), 1);
    }
}
