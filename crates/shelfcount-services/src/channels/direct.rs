use super::{ChannelUpload, UploadChannel};
use crate::credentials::CredentialStore;
use async_trait::async_trait;
use shelfcount_core::models::StoredFileDescriptor;
use shelfcount_core::AppError;
use shelfcount_storage::{DocumentStore, PathResolver, StorageResult, StorageWriter};
use std::sync::Arc;

pub const DIRECT_CHANNEL: &str = "direct";

/// Builds a store that acts with a caller's delegated access token.
pub trait DelegatedStoreFactory: Send + Sync {
    fn create(&self, access_token: &str) -> StorageResult<Arc<dyn DocumentStore>>;
}

#[cfg(feature = "storage-drive")]
pub struct DriveStoreFactory {
    api_base: String,
}

#[cfg(feature = "storage-drive")]
impl DriveStoreFactory {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }
}

#[cfg(feature = "storage-drive")]
impl DelegatedStoreFactory for DriveStoreFactory {
    fn create(&self, access_token: &str) -> StorageResult<Arc<dyn DocumentStore>> {
        Ok(Arc::new(shelfcount_storage::DriveStore::new(
            self.api_base.clone(),
            access_token,
        )?))
    }
}

/// Hands out the server's own store regardless of the token. Used with the local and
/// in-memory backends, which have no per-caller identity; a credential is still required.
pub struct SharedStoreFactory(pub Arc<dyn DocumentStore>);

impl DelegatedStoreFactory for SharedStoreFactory {
    fn create(&self, _access_token: &str) -> StorageResult<Arc<dyn DocumentStore>> {
        Ok(self.0.clone())
    }
}

/// Stores with the credential installed through the authorize endpoint.
pub struct DirectChannel {
    credentials: Arc<CredentialStore>,
    factory: Arc<dyn DelegatedStoreFactory>,
}

impl DirectChannel {
    pub fn new(credentials: Arc<CredentialStore>, factory: Arc<dyn DelegatedStoreFactory>) -> Self {
        Self {
            credentials,
            factory,
        }
    }
}

#[async_trait]
impl UploadChannel for DirectChannel {
    fn name(&self) -> &str {
        DIRECT_CHANNEL
    }

    async fn upload(&self, upload: &ChannelUpload) -> Result<StoredFileDescriptor, AppError> {
        let credential = self.credentials.current().await.ok_or_else(|| {
            AppError::PermissionDenied("direct storage access not authorized".to_string())
        })?;

        let store = self.factory.create(&credential.access_token)?;
        let folder = PathResolver::new(store.clone()).resolve(&upload.path).await?;
        let descriptor = StorageWriter::new(store)
            .write(&folder, upload.payload.clone(), &upload.file_name)
            .await?;
        Ok(descriptor)
    }
}
