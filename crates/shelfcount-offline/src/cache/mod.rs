//! Versioned asset cache
//!
//! A generation is a named bundle of cached responses. Entries are addressed by the
//! SHA-256 of the request URL. At most one generation is current; activating a new one
//! deletes every other.
//!
//! Installs are written to a staging generation and only replace the named generation
//! once complete and marked installed. An interrupted or failed install never touches the
//! generation being served.

mod fs;
mod manager;
mod memory;

pub use fs::FsCacheStore;
pub use manager::{
    CacheLifecycle, CacheStatus, FetchSource, OfflineCacheManager, ServedResponse,
    DEFAULT_DYNAMIC_PREFIXES, DEFAULT_GENERATION, DEFAULT_MANIFEST,
};
pub use memory::MemoryCacheStore;

use crate::net::Response;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid generation name: {0}")]
    InvalidGeneration(String),

    #[error("failed to cache {url}: {reason}")]
    InstallFailed { url: String, reason: String },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: CacheLifecycle,
        action: &'static str,
    },
}

const STAGING_SUFFIX: &str = "~staging";

/// Name of the generation an install of `generation` is written to.
pub fn staging_name(generation: &str) -> String {
    format!("{}{}", generation, STAGING_SUFFIX)
}

/// Content address of a cached URL.
pub fn entry_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Storage for cache generations.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of all existing generations
    async fn generations(&self) -> Result<Vec<String>, CacheError>;

    /// Create the generation if it does not exist yet
    async fn open(&self, generation: &str) -> Result<(), CacheError>;

    async fn put(&self, generation: &str, url: &str, response: &Response) -> Result<(), CacheError>;

    async fn get(&self, generation: &str, url: &str) -> Result<Option<Response>, CacheError>;

    /// URLs cached in a generation
    async fn urls(&self, generation: &str) -> Result<Vec<String>, CacheError>;

    /// Returns whether the generation existed
    async fn delete_generation(&self, generation: &str) -> Result<bool, CacheError>;

    /// Record that every manifest entry of the generation was written.
    async fn mark_installed(&self, generation: &str) -> Result<(), CacheError>;

    /// Whether the generation exists and carries the install marker
    async fn is_installed(&self, generation: &str) -> Result<bool, CacheError>;

    /// Replace `generation` with the contents of `staging`, marker included. `staging`
    /// no longer exists afterwards.
    async fn promote(&self, staging: &str, generation: &str) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key_is_sha256_hex() {
        assert_eq!(
            entry_key("/"),
            "8a5edab282632443219e051e4ade2d1d5bbc671c781051bf1437897cbdfea0f1"
        );
        assert_ne!(entry_key("/a"), entry_key("/b"));
    }

    #[test]
    fn test_staging_name() {
        assert_eq!(staging_name("smart-inventory-v1"), "smart-inventory-v1~staging");
    }
}
