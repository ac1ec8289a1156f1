pub mod media;
pub mod path;
pub mod product;
pub mod submission;
pub mod upload;

pub use media::{MediaPayload, StoredFileDescriptor};
pub use path::{FolderHandle, LogicalPath};
pub use product::ProductLookup;
pub use submission::StockSubmission;
pub use upload::{
    ChannelOutcome, ChannelResult, DriveStatusResponse, ProvisionRequest, ProvisionResponse,
    UploadReport, UploadTestRequest, UploadTestResponse,
};
