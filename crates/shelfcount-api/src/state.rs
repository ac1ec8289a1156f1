//! Application state shared by every handler.

use shelfcount_core::Config;
use shelfcount_services::{CredentialStore, DocumentStore, Provisioner, UploadOrchestrator};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// Server-credential store used by the provisioning entry point and the relay channel
    pub store: Arc<dyn DocumentStore>,
    pub provisioner: Provisioner,
    pub orchestrator: UploadOrchestrator,
    /// Delegated credential for the direct channel
    pub credentials: Arc<CredentialStore>,
}
