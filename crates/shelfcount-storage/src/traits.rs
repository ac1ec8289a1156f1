//! Storage abstraction trait
//!
//! This module defines the DocumentStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use shelfcount_core::models::FolderHandle;
use shelfcount_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the caller may retry the whole operation later.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::IoError(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => AppError::StorageUnavailable(msg),
            StorageError::IoError(err) => AppError::StorageUnavailable(format!("IO error: {}", err)),
            StorageError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidName(msg) => AppError::InvalidInput(msg),
            StorageError::BackendError(msg) => AppError::Internal(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// A file as reported by the backend right after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFile {
    pub id: String,
    pub name: String,
    pub web_view_url: String,
}

/// Document storage abstraction
///
/// All storage backends (Drive, local filesystem, in-memory) implement this trait so the
/// provisioning primitives never couple to a specific service. Folder lookups are exact,
/// case-sensitive name matches; backends may hold several siblings with the same name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Handle of the storage root
    fn root(&self) -> FolderHandle;

    /// Child folders of `parent` named exactly `name`, in backend order
    async fn find_folders(&self, parent: &FolderHandle, name: &str)
        -> StorageResult<Vec<FolderHandle>>;

    /// Create a child folder of `parent`
    async fn create_folder(&self, parent: &FolderHandle, name: &str) -> StorageResult<FolderHandle>;

    /// Ids of files inside `folder` named exactly `name`
    async fn find_files(&self, folder: &FolderHandle, name: &str) -> StorageResult<Vec<String>>;

    /// Create a file inside `folder`
    async fn create_file(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<CreatedFile>;

    /// Make a file readable by anyone holding its link
    async fn grant_public_read(&self, file_id: &str) -> StorageResult<()>;

    /// Direct byte-retrieval URL, derived only from the file id
    fn download_url(&self, file_id: &str) -> String;

    /// Cheap reachability check used by health endpoints
    async fn ping(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        let app: AppError = StorageError::Unavailable("503".into()).into();
        assert!(matches!(app, AppError::StorageUnavailable(_)));

        let app: AppError = StorageError::PermissionDenied("403".into()).into();
        assert!(matches!(app, AppError::PermissionDenied(_)));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let app: AppError = StorageError::IoError(io).into();
        assert!(matches!(app, AppError::StorageUnavailable(msg) if msg.contains("disk")));

        let app: AppError = StorageError::InvalidName("a/b".into()).into();
        assert!(matches!(app, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_is_transient() {
        assert!(StorageError::Unavailable("x".into()).is_transient());
        assert!(!StorageError::PermissionDenied("x".into()).is_transient());
        assert!(!StorageError::NotFound("x".into()).is_transient());
    }
}
