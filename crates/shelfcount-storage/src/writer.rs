use crate::naming::CollisionSafeNamer;
use crate::traits::{DocumentStore, StorageResult};
use shelfcount_core::models::{FolderHandle, MediaPayload, StoredFileDescriptor};
use std::sync::Arc;

/// Persists a payload into a resolved folder and makes it link-readable.
#[derive(Clone)]
pub struct StorageWriter {
    store: Arc<dyn DocumentStore>,
    namer: CollisionSafeNamer,
}

impl StorageWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let namer = CollisionSafeNamer::new(store.clone());
        Self { store, namer }
    }

    pub fn with_namer(store: Arc<dyn DocumentStore>, namer: CollisionSafeNamer) -> Self {
        Self { store, namer }
    }

    /// Write `payload` into `folder` under a collision-free variant of `desired_name`.
    ///
    /// Access is always widened to anyone with the link. A sharing failure is returned as
    /// an error even though the file itself has already been created.
    #[tracing::instrument(skip(self, payload), fields(folder_id = %folder.id, size_bytes = payload.len()))]
    pub async fn write(
        &self,
        folder: &FolderHandle,
        payload: MediaPayload,
        desired_name: &str,
    ) -> StorageResult<StoredFileDescriptor> {
        let start = std::time::Instant::now();
        let name = self.namer.resolve_name(folder, desired_name).await?;
        let content_type = payload.content_type().to_string();

        let created = self
            .store
            .create_file(folder, &name, &content_type, payload.into_bytes())
            .await?;

        if let Err(e) = self.store.grant_public_read(&created.id).await {
            tracing::warn!(
                file_id = %created.id,
                error = %e,
                "File stored but could not be shared"
            );
            return Err(e);
        }

        tracing::info!(
            file_id = %created.id,
            file_name = %created.name,
            backend = %self.store.backend_type(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored file"
        );

        Ok(StoredFileDescriptor {
            download_url: self.store.download_url(&created.id),
            file_id: created.id,
            file_name: created.name,
            folder_id: folder.id.clone(),
            web_view_url: created.web_view_url,
        })
    }
}
