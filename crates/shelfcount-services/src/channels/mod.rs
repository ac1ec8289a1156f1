//! Upload channels
//!
//! A channel is one independent way of getting a file into the document store. The
//! orchestrator hands every channel the same already-decoded upload; each channel reports
//! its own success or failure.

pub mod direct;
pub mod relay;

use async_trait::async_trait;
use shelfcount_core::models::{LogicalPath, MediaPayload, StoredFileDescriptor};
use shelfcount_core::AppError;

#[cfg(feature = "storage-drive")]
pub use direct::DriveStoreFactory;
pub use direct::{DelegatedStoreFactory, DirectChannel, SharedStoreFactory};
pub use relay::RelayChannel;

/// One upload as seen by every channel of an orchestration.
#[derive(Debug, Clone)]
pub struct ChannelUpload {
    pub path: LogicalPath,
    pub file_name: String,
    pub payload: MediaPayload,
    /// The payload as originally received, for channels that forward it.
    pub encoded: String,
}

#[async_trait]
pub trait UploadChannel: Send + Sync {
    /// Name used as the key in upload reports
    fn name(&self) -> &str;

    async fn upload(&self, upload: &ChannelUpload) -> Result<StoredFileDescriptor, AppError>;
}
