use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Decoded image bytes ready to be written, with the MIME type inferred from the
/// proposed file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    bytes: Vec<u8>,
    content_type: String,
    file_name: String,
}

impl MediaPayload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Evidence of a completed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFileDescriptor {
    pub file_id: String,
    /// Final name, which differs from the requested one after a collision.
    pub file_name: String,
    pub folder_id: String,
    pub download_url: String,
    pub web_view_url: String,
}
