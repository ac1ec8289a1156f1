use crate::traits::{CreatedFile, DocumentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use shelfcount_core::models::FolderHandle;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Folders are directories under `base_path` and ids are paths relative to it, so a
/// folder name is unique among its siblings here. The root id is the empty string.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored files (e.g., "/var/lib/shelfcount/uploads")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:5000/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url,
        })
    }

    fn validate_name(name: &str) -> StorageResult<()> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(StorageError::InvalidName(format!(
                "'{}' is not a valid entry name",
                name
            )));
        }
        Ok(())
    }

    /// Convert a relative id to a filesystem path, rejecting anything that could escape
    /// the base directory.
    fn id_to_path(&self, id: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidName(
                "Storage id resolves outside storage directory".to_string(),
            ));
        }
        Ok(self.base_path.join(relative))
    }

    fn child_id(parent: &FolderHandle, name: &str) -> String {
        if parent.id.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent.id, name)
        }
    }

    fn generate_url(&self, id: &str) -> String {
        let encoded: Vec<String> = id
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn root(&self) -> FolderHandle {
        FolderHandle::new("", "")
    }

    async fn find_folders(
        &self,
        parent: &FolderHandle,
        name: &str,
    ) -> StorageResult<Vec<FolderHandle>> {
        Self::validate_name(name)?;
        let id = Self::child_id(parent, name);
        let path = self.id_to_path(&id)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(vec![FolderHandle::new(id, name)]),
            Ok(_) => Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_folder(&self, parent: &FolderHandle, name: &str) -> StorageResult<FolderHandle> {
        Self::validate_name(name)?;
        let id = Self::child_id(parent, name);
        let path = self.id_to_path(&id)?;

        match fs::create_dir(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Local folder created");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(StorageError::PermissionDenied(format!(
                    "Cannot create {}: {}",
                    path.display(),
                    e
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(FolderHandle::new(id, name))
    }

    async fn find_files(&self, folder: &FolderHandle, name: &str) -> StorageResult<Vec<String>> {
        Self::validate_name(name)?;
        let id = Self::child_id(folder, name);
        let path = self.id_to_path(&id)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(vec![id]),
            Ok(_) => Ok(Vec::new()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_file(
        &self,
        folder: &FolderHandle,
        name: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<CreatedFile> {
        Self::validate_name(name)?;
        let id = Self::child_id(folder, name);
        let path = self.id_to_path(&id)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::InvalidName(format!(
                    "File {} already exists",
                    path.display()
                )),
                std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(format!(
                    "Cannot create {}: {}",
                    path.display(),
                    e
                )),
                _ => StorageError::Unavailable(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                )),
            })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::Unavailable(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            id = %id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(CreatedFile {
            web_view_url: self.generate_url(&id),
            id,
            name: name.to_string(),
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> StorageResult<()> {
        // Everything under base_url is already served publicly.
        let path = self.id_to_path(file_id)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(file_id.to_string()));
        }
        Ok(())
    }

    fn download_url(&self, file_id: &str) -> String {
        self.generate_url(file_id)
    }

    async fn ping(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::Unavailable(format!("{}: {}", self.base_path.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store(dir: &Path) -> LocalStore {
        LocalStore::new(dir, "http://localhost:5000/uploads".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_folder_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        let root = storage.root();

        assert!(storage.find_folders(&root, "Project").await.unwrap().is_empty());
        let first = storage.create_folder(&root, "Project").await.unwrap();
        let second = storage.create_folder(&root, "Project").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.id, "Project");

        let child = storage.create_folder(&first, "สาขา").await.unwrap();
        assert_eq!(child.id, "Project/สาขา");
        assert_eq!(storage.find_folders(&first, "สาขา").await.unwrap(), vec![child]);
    }

    #[tokio::test]
    async fn test_write_file_and_urls() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        let folder = storage.create_folder(&storage.root(), "My Folder").await.unwrap();

        let created = storage
            .create_file(&folder, "a b.png", "image/png", b"png".to_vec())
            .await
            .unwrap();
        assert_eq!(created.id, "My Folder/a b.png");
        assert_eq!(
            storage.download_url(&created.id),
            "http://localhost:5000/uploads/My%20Folder/a%20b.png"
        );
        assert_eq!(storage.find_files(&folder, "a b.png").await.unwrap(), vec![created.id.clone()]);
        storage.grant_public_read(&created.id).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("My Folder").join("a b.png")).unwrap();
        assert_eq!(on_disk, b"png");
    }

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        let root = storage.root();
        storage
            .create_file(&root, "a.jpg", "image/jpeg", b"first".to_vec())
            .await
            .unwrap();

        let err = storage
            .create_file(&root, "a.jpg", "image/jpeg", b"second".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = store(dir.path()).await;
        let root = storage.root();

        let result = storage.create_folder(&root, "..").await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));

        let result = storage.find_files(&root, "a/b").await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));

        let result = storage.grant_public_read("../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
    }
}
