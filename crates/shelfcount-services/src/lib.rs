//! Shelfcount Services Layer
//!
//! This crate is the business service layer: provisioning, upload channels and their
//! orchestration. It re-exports the storage and processing APIs the server needs so that
//! the API crate depends on a single service facade. Keep coordination here; keep thin
//! HTTP handling in shelfcount-api.

pub mod branches;
pub mod channels;
pub mod credentials;
pub mod orchestrator;
pub mod provisioner;

pub use branches::BranchFolders;
pub use channels::{ChannelUpload, DirectChannel, RelayChannel, UploadChannel};
#[cfg(feature = "storage-drive")]
pub use channels::DriveStoreFactory;
pub use channels::{DelegatedStoreFactory, SharedStoreFactory};
pub use credentials::{CredentialStore, DelegatedCredential};
pub use orchestrator::{test_upload_file_name, UploadOrchestrator};
pub use provisioner::Provisioner;

pub use shelfcount_processing::{MediaIngestor, MediaValidator};
pub use shelfcount_storage::{
    create_storage, CollisionSafeNamer, DocumentStore, MemoryStore, PathResolver,
    StorageBackend, StorageError, StorageResult, StorageWriter,
};
