//! Provisioning: one encoded image into one folder path.

use shelfcount_core::models::{
    LogicalPath, MediaPayload, ProvisionRequest, ProvisionResponse, StoredFileDescriptor,
};
use shelfcount_core::AppError;
use shelfcount_processing::{MediaIngestor, MediaValidator};
use shelfcount_storage::{DocumentStore, PathResolver, StorageWriter};
use std::sync::Arc;

const MISSING_FIELDS: &str = "Missing required fields: imageData, filename, or folder";

/// Resolves a folder path and writes a decoded payload into it.
#[derive(Clone)]
pub struct Provisioner {
    resolver: PathResolver,
    writer: StorageWriter,
    ingestor: MediaIngestor,
    validator: MediaValidator,
}

impl Provisioner {
    pub fn new(store: Arc<dyn DocumentStore>, max_file_size: usize) -> Self {
        Self {
            resolver: PathResolver::new(store.clone()),
            writer: StorageWriter::new(store),
            ingestor: MediaIngestor::new(),
            validator: MediaValidator::new(max_file_size),
        }
    }

    pub fn with_parts(resolver: PathResolver, writer: StorageWriter, validator: MediaValidator) -> Self {
        Self {
            resolver,
            writer,
            ingestor: MediaIngestor::new(),
            validator,
        }
    }

    pub fn with_strict_resolution(mut self, strict: bool) -> Self {
        self.resolver = self.resolver.with_strict(strict);
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.resolver.store()
    }

    pub fn validator(&self) -> MediaValidator {
        self.validator
    }

    /// Decode and size-check an encoded image.
    pub fn ingest(&self, encoded: &str, file_name: &str) -> Result<MediaPayload, AppError> {
        self.validator.validate_encoded_len(encoded.len())?;
        let payload = self.ingestor.ingest(encoded, file_name)?;
        self.validator.validate(&payload)?;
        Ok(payload)
    }

    /// Resolve `path` and write an already-decoded payload into it.
    pub async fn store_payload(
        &self,
        path: &LogicalPath,
        payload: MediaPayload,
        file_name: &str,
    ) -> Result<StoredFileDescriptor, AppError> {
        let folder = self.resolver.resolve(path).await?;
        Ok(self.writer.write(&folder, payload, file_name).await?)
    }

    #[tracing::instrument(skip(self, request), fields(folder = %request.folder, filename = %request.filename))]
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionResponse, AppError> {
        let filename = request.filename.trim();
        let path = LogicalPath::parse(&request.folder);
        if request.image_data.trim().is_empty() || filename.is_empty() || path.is_root() {
            return Err(AppError::InvalidInput(MISSING_FIELDS.to_string()));
        }

        let payload = self.ingest(&request.image_data, filename)?;
        let descriptor = self.store_payload(&path, payload, filename).await?;
        Ok(ProvisionResponse::stored(path.to_string(), &descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfcount_storage::{InjectedFailure, MemoryStore, StoreOperation};

    const PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

    fn request(folder: &str) -> ProvisionRequest {
        ProvisionRequest {
            image_data: PIXEL_PNG.to_string(),
            filename: "shelf.png".to_string(),
            folder: folder.to_string(),
        }
    }

    #[tokio::test]
    async fn test_provision_stores_file() {
        let store = Arc::new(MemoryStore::default());
        let provisioner = Provisioner::new(store.clone(), 1024);

        let response = provisioner
            .provision(&request("Check Stock Project/ สาขาตัวเมือง"))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.folder.as_deref(), Some("Check Stock Project/สาขาตัวเมือง"));
        assert_eq!(response.filename.as_deref(), Some("shelf.png"));

        let stored = store.file(response.file_id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.content_type, "image/png");
        assert!(stored.public);
        assert_eq!(Some(stored.folder_id), response.folder_id);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let provisioner = Provisioner::new(Arc::new(MemoryStore::default()), 1024);
        for req in [
            ProvisionRequest { image_data: String::new(), ..request("A") },
            ProvisionRequest { filename: " ".to_string(), ..request("A") },
            request(" / "),
        ] {
            let err = provisioner.provision(&req).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(ref m) if m == MISSING_FIELDS));
        }
    }

    #[tokio::test]
    async fn test_bad_payload_creates_no_folders() {
        let store = Arc::new(MemoryStore::default());
        let provisioner = Provisioner::new(store.clone(), 1024);
        let req = ProvisionRequest {
            image_data: "data:image/png;base64".to_string(),
            ..request("A/B")
        };

        let err = provisioner.provision(&req).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidEncoding(_)));
        assert_eq!(store.folder_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_payload() {
        let provisioner = Provisioner::new(Arc::new(MemoryStore::default()), 10);
        let err = provisioner.provision(&request("A")).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_taxonomy() {
        let store = Arc::new(MemoryStore::default());
        store.inject_failure(StoreOperation::CreateFolder, InjectedFailure::Unavailable);
        let provisioner = Provisioner::new(store, 1024);

        let err = provisioner.provision(&request("A")).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}
