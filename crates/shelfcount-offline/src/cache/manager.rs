use super::{staging_name, CacheError, CacheStore};
use crate::net::{Network, Request, Response};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Generation name shipped with the client. Bumping it is the only way to invalidate
/// cached assets.
pub const DEFAULT_GENERATION: &str = "smart-inventory-v1";

pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/barcode.js",
    "/static/manifest.json",
    "https://unpkg.com/html5-qrcode@2.3.8/html5-qrcode.min.js",
];

/// Routes that always go to the network.
pub const DEFAULT_DYNAMIC_PREFIXES: &[&str] = &[
    "/api/",
    "/submit_stock",
    "/get_product",
    "/test_upload",
    "/drive_status",
    "/authorize_drive",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheLifecycle {
    Installing,
    Installed,
    Active,
    Superseded,
}

impl fmt::Display for CacheLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheLifecycle::Installing => "installing",
            CacheLifecycle::Installed => "installed",
            CacheLifecycle::Active => "active",
            CacheLifecycle::Superseded => "superseded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
    /// Not intercepted: non-GET, dynamic route, or no active generation
    Passthrough,
    /// Cache miss and network failure
    Offline,
}

#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub response: Response,
    pub source: FetchSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub generation: String,
    pub state: CacheLifecycle,
    pub entries: Vec<String>,
    pub generations: Vec<String>,
}

/// Lifecycle of one cache generation.
///
/// `Installing -> Installed -> Active -> Superseded`. Install fetches the whole manifest
/// or nothing; activation sweeps every other generation.
pub struct OfflineCacheManager {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    generation: String,
    manifest: Vec<String>,
    dynamic_prefixes: Vec<String>,
    state: CacheLifecycle,
}

impl OfflineCacheManager {
    pub fn new(
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        generation: impl Into<String>,
    ) -> Self {
        Self {
            store,
            network,
            generation: generation.into(),
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            dynamic_prefixes: DEFAULT_DYNAMIC_PREFIXES.iter().map(|s| s.to_string()).collect(),
            state: CacheLifecycle::Installing,
        }
    }

    pub fn with_manifest(mut self, manifest: Vec<String>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_dynamic_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.dynamic_prefixes = prefixes;
        self
    }

    /// Resume a generation that an earlier run installed but did not activate.
    pub fn resume_installed(mut self) -> Self {
        self.state = CacheLifecycle::Installed;
        self
    }

    /// Resume a generation that was already activated by an earlier run.
    pub fn resume_active(mut self) -> Self {
        self.state = CacheLifecycle::Active;
        self
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn state(&self) -> CacheLifecycle {
        self.state
    }

    pub fn is_dynamic(&self, request: &Request) -> bool {
        let path = request.path();
        self.dynamic_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Populate this generation with every manifest entry.
    ///
    /// Entries are written to a staging generation that is marked installed and then
    /// promoted under the real name. Any failure removes only the staging generation and
    /// leaves the state at `Installing`, so install can simply be retried and a stored
    /// generation of the same name keeps serving.
    pub async fn install(&mut self) -> Result<(), CacheError> {
        if self.state != CacheLifecycle::Installing {
            return Err(CacheError::InvalidTransition {
                state: self.state,
                action: "install",
            });
        }

        let staging = staging_name(&self.generation);
        // Left over from an interrupted run
        self.store.delete_generation(&staging).await?;
        self.store.open(&staging).await?;
        if let Err(err) = self.populate(&staging).await {
            tracing::warn!(generation = %self.generation, error = %err, "Cache install failed");
            self.store.delete_generation(&staging).await?;
            return Err(err);
        }
        self.store.mark_installed(&staging).await?;
        self.store.promote(&staging, &self.generation).await?;

        self.state = CacheLifecycle::Installed;
        tracing::info!(
            generation = %self.generation,
            entries = self.manifest.len(),
            "Cache generation installed"
        );
        Ok(())
    }

    async fn populate(&self, target: &str) -> Result<(), CacheError> {
        for url in &self.manifest {
            let request = Request::get(url.clone());
            if self.is_dynamic(&request) {
                tracing::warn!(url = %url, "Skipping dynamic route listed in cache manifest");
                continue;
            }

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| CacheError::InstallFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            if response.status != 200 {
                return Err(CacheError::InstallFailed {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            self.store.put(target, url, &response).await?;
        }
        Ok(())
    }

    /// Make this generation current and delete every other one. Returns the evicted names.
    pub async fn activate(&mut self) -> Result<Vec<String>, CacheError> {
        if self.state != CacheLifecycle::Installed {
            return Err(CacheError::InvalidTransition {
                state: self.state,
                action: "activate",
            });
        }

        let mut evicted = Vec::new();
        for name in self.store.generations().await? {
            if name != self.generation && self.store.delete_generation(&name).await? {
                tracing::info!(generation = %name, "Deleted stale cache generation");
                evicted.push(name);
            }
        }

        self.state = CacheLifecycle::Active;
        tracing::info!(generation = %self.generation, evicted = evicted.len(), "Cache generation active");
        Ok(evicted)
    }

    /// Mark this generation as replaced by a newer one.
    pub fn supersede(&mut self) {
        self.state = CacheLifecycle::Superseded;
    }

    /// Serve a request.
    ///
    /// Passthrough requests surface network errors unchanged; intercepted GETs never fail
    /// and fall back to [`Response::offline`].
    pub async fn handle_fetch(&self, request: &Request) -> Result<ServedResponse, crate::net::NetworkError> {
        if !request.is_get() || self.is_dynamic(request) || self.state != CacheLifecycle::Active {
            let response = self.network.fetch(request).await?;
            return Ok(ServedResponse {
                response,
                source: FetchSource::Passthrough,
            });
        }

        match self.store.get(&self.generation, &request.url).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, "Serving from cache");
                return Ok(ServedResponse {
                    response,
                    source: FetchSource::Cache,
                });
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "Cache read failed");
            }
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(err) = self.store.put(&self.generation, &request.url, &response).await {
                        tracing::warn!(url = %request.url, error = %err, "Cache write failed");
                    }
                }
                Ok(ServedResponse {
                    response,
                    source: FetchSource::Network,
                })
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "Fetch failed, serving offline response");
                Ok(ServedResponse {
                    response: Response::offline(),
                    source: FetchSource::Offline,
                })
            }
        }
    }

    pub async fn status(&self) -> Result<CacheStatus, CacheError> {
        Ok(CacheStatus {
            generation: self.generation.clone(),
            state: self.state,
            entries: self.store.urls(&self.generation).await?,
            generations: self.store.generations().await?,
        })
    }
}
