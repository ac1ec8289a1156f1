use super::{entry_key, CacheError, CacheStore};
use crate::net::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const INSTALLED_MARKER: &str = ".installed";
const RETIRED_SUFFIX: &str = "~retired";

#[derive(Serialize, Deserialize)]
struct CachedEntry {
    url: String,
    cached_at: chrono::DateTime<chrono::Utc>,
    response: Response,
}

/// Filesystem cache store: one directory per generation, one JSON file per entry named by
/// the entry's content address, and an empty `.installed` file once the install completed.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn generation_dir(&self, generation: &str) -> Result<PathBuf, CacheError> {
        if generation.is_empty()
            || generation.starts_with('.')
            || generation.contains(['/', '\\', '\0'])
        {
            return Err(CacheError::InvalidGeneration(generation.to_string()));
        }
        Ok(self.root.join(generation))
    }

    fn entry_path(dir: &Path, url: &str) -> PathBuf {
        dir.join(format!("{}.json", entry_key(url)))
    }
}

async fn remove_dir_if_exists(dir: &Path) -> Result<bool, CacheError> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn generations(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn open(&self, generation: &str) -> Result<(), CacheError> {
        fs::create_dir_all(self.generation_dir(generation)?).await?;
        Ok(())
    }

    async fn put(&self, generation: &str, url: &str, response: &Response) -> Result<(), CacheError> {
        let dir = self.generation_dir(generation)?;
        fs::create_dir_all(&dir).await?;

        let entry = CachedEntry {
            url: url.to_string(),
            cached_at: chrono::Utc::now(),
            response: response.clone(),
        };
        let path = Self::entry_path(&dir, url);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, generation: &str, url: &str) -> Result<Option<Response>, CacheError> {
        let path = Self::entry_path(&self.generation_dir(generation)?, url);
        match fs::read(&path).await {
            Ok(bytes) => {
                let entry: CachedEntry = serde_json::from_slice(&bytes)?;
                Ok(Some(entry.response))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn urls(&self, generation: &str) -> Result<Vec<String>, CacheError> {
        let dir = self.generation_dir(generation)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut urls = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let cached: CachedEntry = serde_json::from_slice(&fs::read(&path).await?)?;
            urls.push(cached.url);
        }
        urls.sort();
        Ok(urls)
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, CacheError> {
        remove_dir_if_exists(&self.generation_dir(generation)?).await
    }

    async fn mark_installed(&self, generation: &str) -> Result<(), CacheError> {
        let dir = self.generation_dir(generation)?;
        if !fs::try_exists(&dir).await? {
            return Err(CacheError::InvalidGeneration(generation.to_string()));
        }
        fs::write(dir.join(INSTALLED_MARKER), b"").await?;
        Ok(())
    }

    async fn is_installed(&self, generation: &str) -> Result<bool, CacheError> {
        let marker = self.generation_dir(generation)?.join(INSTALLED_MARKER);
        Ok(fs::try_exists(&marker).await?)
    }

    /// The old directory is renamed aside before the staged one takes its place, so the
    /// generation is never left half-written.
    async fn promote(&self, staging: &str, generation: &str) -> Result<(), CacheError> {
        let from = self.generation_dir(staging)?;
        let to = self.generation_dir(generation)?;
        let retired = self.generation_dir(&format!("{}{}", generation, RETIRED_SUFFIX))?;

        remove_dir_if_exists(&retired).await?;
        let replaced = match fs::rename(&to, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if let Err(err) = fs::rename(&from, &to).await {
            if replaced {
                fs::rename(&retired, &to).await?;
            }
            return Err(err.into());
        }
        remove_dir_if_exists(&retired).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ResponseKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let response = Response::new(200, "<html>", ResponseKind::Basic);
        {
            let store = FsCacheStore::new(dir.path()).await.unwrap();
            store.put("smart-inventory-v1", "/", &response).await.unwrap();
        }

        let store = FsCacheStore::new(dir.path()).await.unwrap();
        assert_eq!(store.generations().await.unwrap(), vec!["smart-inventory-v1"]);
        assert_eq!(store.get("smart-inventory-v1", "/").await.unwrap(), Some(response));
        assert_eq!(store.urls("smart-inventory-v1").await.unwrap(), vec!["/"]);
        assert!(dir
            .path()
            .join("smart-inventory-v1")
            .join(format!("{}.json", entry_key("/")))
            .exists());
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).await.unwrap();
        store.open("v1").await.unwrap();
        assert!(store.delete_generation("v1").await.unwrap());
        assert!(!store.delete_generation("v1").await.unwrap());
        assert!(store.generations().await.unwrap().is_empty());
        assert_eq!(store.get("v1", "/").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_promote_replaces_generation_with_marker() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).await.unwrap();
        let old = Response::new(200, "old", ResponseKind::Basic);
        let new = Response::new(200, "new", ResponseKind::Basic);

        store.put("v1", "/", &old).await.unwrap();
        store.put("v1", "/stale.js", &old).await.unwrap();
        store.mark_installed("v1").await.unwrap();

        store.put("v1~staging", "/", &new).await.unwrap();
        assert!(!store.is_installed("v1~staging").await.unwrap());
        store.mark_installed("v1~staging").await.unwrap();
        store.promote("v1~staging", "v1").await.unwrap();

        assert_eq!(store.generations().await.unwrap(), vec!["v1"]);
        assert!(store.is_installed("v1").await.unwrap());
        assert_eq!(store.get("v1", "/").await.unwrap(), Some(new));
        assert_eq!(store.urls("v1").await.unwrap(), vec!["/"]);
    }

    #[tokio::test]
    async fn test_opened_generation_is_not_installed() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).await.unwrap();
        store.open("v2").await.unwrap();
        assert!(!store.is_installed("v2").await.unwrap());
        assert!(!store.is_installed("missing").await.unwrap());
        assert!(store.mark_installed("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_generation_names_cannot_escape_root() {
        let dir = tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).await.unwrap();
        assert!(matches!(
            store.open("../outside").await,
            Err(CacheError::InvalidGeneration(_))
        ));
        assert!(matches!(store.open("..").await, Err(CacheError::InvalidGeneration(_))));
    }
}
