#[cfg(feature = "storage-drive")]
use crate::DriveStore;
#[cfg(feature = "storage-local")]
use crate::LocalStore;
use crate::{DocumentStore, MemoryStore, StorageBackend, StorageError, StorageResult};
use shelfcount_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn DocumentStore>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-drive")]
        StorageBackend::Drive => {
            let token = config.drive_access_token().ok_or_else(|| {
                StorageError::ConfigError("DRIVE_ACCESS_TOKEN not configured".to_string())
            })?;
            let storage = DriveStore::new(config.drive_api_base_url(), token)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-drive"))]
        StorageBackend::Drive => Err(StorageError::ConfigError(
            "Drive storage backend not available (storage-drive feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStore::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => Ok(Arc::new(MemoryStore::default())),
    }
}
