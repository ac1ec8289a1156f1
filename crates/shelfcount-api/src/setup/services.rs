//! Service initialization and application state setup

use crate::state::AppState;
use anyhow::{Context, Result};
use shelfcount_core::Config;
use shelfcount_services::{
    create_storage, BranchFolders, CredentialStore, DelegatedStoreFactory, DirectChannel,
    DocumentStore, Provisioner, RelayChannel, SharedStoreFactory, StorageBackend,
    UploadChannel, UploadOrchestrator,
};
use std::sync::Arc;
use std::time::Duration;

/// Initialize storage and every service, returning the application state
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let store = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = %store.backend_type(), "Storage backend initialized");

    build_state(config, store)
}

/// Build the application state around an already created store.
pub fn build_state(config: &Config, store: Arc<dyn DocumentStore>) -> Result<Arc<AppState>> {
    let provisioner = Provisioner::new(store.clone(), config.max_image_size_bytes())
        .with_strict_resolution(config.strict_folder_resolution());
    let credentials = Arc::new(CredentialStore::new());
    let channel_timeout = Duration::from_secs(config.channel_timeout_secs());

    let mut channels: Vec<Arc<dyn UploadChannel>> = Vec::new();
    for name in config.upload_channels() {
        if channels.iter().any(|c| c.name() == name.as_str()) {
            return Err(anyhow::anyhow!("Upload channel '{}' is configured twice", name));
        }
        let channel: Arc<dyn UploadChannel> = match name.as_str() {
            "relay" => Arc::new(relay_channel(config, &provisioner, channel_timeout)?),
            "direct" => Arc::new(DirectChannel::new(
                credentials.clone(),
                delegated_factory(config, &store),
            )),
            other => return Err(anyhow::anyhow!("Unknown upload channel '{}'", other)),
        };
        channels.push(channel);
    }

    let orchestrator = UploadOrchestrator::new(
        channels,
        BranchFolders::from_config(config),
        provisioner.validator(),
        channel_timeout,
    );
    tracing::info!(
        channels = ?orchestrator.channel_names(),
        "Upload orchestrator initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        store,
        provisioner,
        orchestrator,
        credentials,
    }))
}

fn relay_channel(config: &Config, provisioner: &Provisioner, timeout: Duration) -> Result<RelayChannel> {
    match config.relay_url() {
        #[cfg(feature = "relay-remote")]
        Some(url) => {
            tracing::info!(url = %url, "Relay channel forwards to remote provisioning endpoint");
            RelayChannel::remote(url, timeout)
        }
        #[cfg(not(feature = "relay-remote"))]
        Some(_) => Err(anyhow::anyhow!(
            "RELAY_URL is set but the relay-remote feature is not enabled"
        )),
        None => Ok(RelayChannel::in_process(provisioner.clone())),
    }
}

/// Delegated credentials only mean something for Drive; other backends reuse the
/// server's store once a credential has been installed.
fn delegated_factory(config: &Config, store: &Arc<dyn DocumentStore>) -> Arc<dyn DelegatedStoreFactory> {
    match config.storage_backend() {
        #[cfg(feature = "storage-drive")]
        StorageBackend::Drive => Arc::new(shelfcount_services::DriveStoreFactory::new(
            config.drive_api_base_url(),
        )),
        _ => Arc::new(SharedStoreFactory(store.clone())),
    }
}
