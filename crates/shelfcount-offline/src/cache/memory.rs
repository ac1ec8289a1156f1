use super::{entry_key, CacheError, CacheStore};
use crate::net::Response;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Generation {
    entries: HashMap<String, (String, Response)>,
    installed: bool,
}

/// In-memory cache store
#[derive(Default)]
pub struct MemoryCacheStore {
    generations: RwLock<BTreeMap<String, Generation>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn generations(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn open(&self, generation: &str) -> Result<(), CacheError> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, generation: &str, url: &str, response: &Response) -> Result<(), CacheError> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default()
            .entries
            .insert(entry_key(url), (url.to_string(), response.clone()));
        Ok(())
    }

    async fn get(&self, generation: &str, url: &str) -> Result<Option<Response>, CacheError> {
        Ok(self
            .generations
            .read()
            .await
            .get(generation)
            .and_then(|g| g.entries.get(&entry_key(url)))
            .map(|(_, response)| response.clone()))
    }

    async fn urls(&self, generation: &str) -> Result<Vec<String>, CacheError> {
        let mut urls: Vec<String> = self
            .generations
            .read()
            .await
            .get(generation)
            .map(|g| g.entries.values().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default();
        urls.sort();
        Ok(urls)
    }

    async fn delete_generation(&self, generation: &str) -> Result<bool, CacheError> {
        Ok(self.generations.write().await.remove(generation).is_some())
    }

    async fn mark_installed(&self, generation: &str) -> Result<(), CacheError> {
        match self.generations.write().await.get_mut(generation) {
            Some(g) => {
                g.installed = true;
                Ok(())
            }
            None => Err(CacheError::InvalidGeneration(generation.to_string())),
        }
    }

    async fn is_installed(&self, generation: &str) -> Result<bool, CacheError> {
        Ok(self
            .generations
            .read()
            .await
            .get(generation)
            .is_some_and(|g| g.installed))
    }

    async fn promote(&self, staging: &str, generation: &str) -> Result<(), CacheError> {
        let mut generations = self.generations.write().await;
        let staged = generations
            .remove(staging)
            .ok_or_else(|| CacheError::InvalidGeneration(staging.to_string()))?;
        generations.insert(generation.to_string(), staged);
        Ok(())
    }
}
