//! In-memory document store
//!
//! Mirrors Drive semantics closely enough to exercise provisioning without a network:
//! sibling folders may share a name, ids are opaque, and every operation yields to the
//! scheduler once so concurrent callers interleave the way they would against a remote
//! service. Failures can be injected per operation to drive partial-failure paths.

use crate::traits::{CreatedFile, DocumentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use shelfcount_core::models::FolderHandle;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

const ROOT_ID: &str = "root";

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FindFolders,
    CreateFolder,
    FindFiles,
    CreateFile,
    GrantPublicRead,
}

/// Failure returned by an injected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Unavailable,
    PermissionDenied,
}

impl InjectedFailure {
    fn to_error(self, op: StoreOperation) -> StorageError {
        match self {
            InjectedFailure::Unavailable => {
                StorageError::Unavailable(format!("{:?} failed: backend unreachable", op))
            }
            InjectedFailure::PermissionDenied => {
                StorageError::PermissionDenied(format!("{:?} rejected by backend", op))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct FolderRecord {
    id: String,
    name: String,
    parent_id: String,
}

/// A stored file, exposed for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    pub folder_id: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub public: bool,
}

#[derive(Default)]
struct MemoryState {
    folders: Vec<FolderRecord>,
    files: Vec<StoredObject>,
}

#[derive(Default)]
struct FailurePlan {
    operations: HashMap<StoreOperation, InjectedFailure>,
    denied_folder_names: HashSet<String>,
}

/// In-memory storage implementation
pub struct MemoryStore {
    base_url: String,
    state: RwLock<MemoryState>,
    failures: RwLock<FailurePlan>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory://shelfcount")
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            state: RwLock::new(MemoryState::default()),
            failures: RwLock::new(FailurePlan::default()),
        }
    }

    /// Make every subsequent `op` fail with `failure` until cleared.
    pub fn inject_failure(&self, op: StoreOperation, failure: InjectedFailure) {
        write(&self.failures).operations.insert(op, failure);
    }

    /// Reject creation of folders with this exact name.
    pub fn deny_folder_creation(&self, name: &str) {
        write(&self.failures)
            .denied_folder_names
            .insert(name.to_string());
    }

    pub fn clear_failures(&self) {
        let mut plan = write(&self.failures);
        plan.operations.clear();
        plan.denied_folder_names.clear();
    }

    /// Number of folders named `name` anywhere in the store.
    pub fn count_folders_named(&self, name: &str) -> usize {
        read(&self.state)
            .folders
            .iter()
            .filter(|f| f.name == name)
            .count()
    }

    pub fn folder_count(&self) -> usize {
        read(&self.state).folders.len()
    }

    pub fn file(&self, id: &str) -> Option<StoredObject> {
        read(&self.state).files.iter().find(|f| f.id == id).cloned()
    }

    pub fn files_in(&self, folder_id: &str) -> Vec<StoredObject> {
        read(&self.state)
            .files
            .iter()
            .filter(|f| f.folder_id == folder_id)
            .cloned()
            .collect()
    }

    pub fn file_count(&self) -> usize {
        read(&self.state).files.len()
    }

    fn check(&self, op: StoreOperation) -> StorageResult<()> {
        match read(&self.failures).operations.get(&op) {
            Some(failure) => Err(failure.to_error(op)),
            None => Ok(()),
        }
    }

    fn folder_exists(state: &MemoryState, id: &str) -> bool {
        id == ROOT_ID || state.folders.iter().any(|f| f.id == id)
    }

    fn web_view_url(&self, id: &str) -> String {
        format!("{}/file/d/{}/view", self.base_url, id)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn root(&self) -> FolderHandle {
        FolderHandle::new(ROOT_ID, "My Drive")
    }

    async fn find_folders(
        &self,
        parent: &FolderHandle,
        name: &str,
    ) -> StorageResult<Vec<FolderHandle>> {
        tokio::task::yield_now().await;
        self.check(StoreOperation::FindFolders)?;

        let state = read(&self.state);
        if !Self::folder_exists(&state, &parent.id) {
            return Err(StorageError::NotFound(format!("folder {}", parent.id)));
        }
        Ok(state
            .folders
            .iter()
            .filter(|f| f.parent_id == parent.id && f.name == name)
            .map(|f| FolderHandle::new(f.id.clone(), f.name.clone()))
            .collect())
    }

    async fn create_folder(&self, parent: &FolderHandle, name: &str) -> StorageResult<FolderHandle> {
        tokio::task::yield_now().await;
        self.check(StoreOperation::CreateFolder)?;
        if read(&self.failures).denied_folder_names.contains(name) {
            return Err(StorageError::PermissionDenied(format!(
                "creating folder '{}' is not allowed",
                name
            )));
        }
        if name.trim().is_empty() {
            return Err(StorageError::InvalidName("folder name is empty".to_string()));
        }

        let mut state = write(&self.state);
        if !Self::folder_exists(&state, &parent.id) {
            return Err(StorageError::NotFound(format!("folder {}", parent.id)));
        }
        let record = FolderRecord {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            parent_id: parent.id.clone(),
        };
        let handle = FolderHandle::new(record.id.clone(), record.name.clone());
        state.folders.push(record);
        Ok(handle)
    }

    async fn find_files(&self, folder: &FolderHandle, name: &str) -> StorageResult<Vec<String>> {
        tokio::task::yield_now().await;
        self.check(StoreOperation::FindFiles)?;

        Ok(read(&self.state)
            .files
            .iter()
            .filter(|f| f.folder_id == folder.id && f.name == name)
            .map(|f| f.id.clone())
            .collect())
    }

    async fn create_file(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<CreatedFile> {
        tokio::task::yield_now().await;
        self.check(StoreOperation::CreateFile)?;

        let mut state = write(&self.state);
        if !Self::folder_exists(&state, &folder.id) {
            return Err(StorageError::NotFound(format!("folder {}", folder.id)));
        }
        let id = Uuid::new_v4().simple().to_string();
        state.files.push(StoredObject {
            id: id.clone(),
            name: name.to_string(),
            folder_id: folder.id.clone(),
            content_type: content_type.to_string(),
            data,
            public: false,
        });

        Ok(CreatedFile {
            web_view_url: self.web_view_url(&id),
            id,
            name: name.to_string(),
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> StorageResult<()> {
        tokio::task::yield_now().await;
        self.check(StoreOperation::GrantPublicRead)?;

        let mut state = write(&self.state);
        let file = state
            .files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;
        file.public = true;
        Ok(())
    }

    fn download_url(&self, file_id: &str) -> String {
        format!("{}/uc?id={}", self.base_url, file_id)
    }

    async fn ping(&self) -> StorageResult<()> {
        self.check(StoreOperation::FindFolders)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
