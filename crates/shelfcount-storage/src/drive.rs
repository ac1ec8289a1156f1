//! Google Drive v3 backend
//!
//! Talks to the Drive REST API with a bearer token. The token is either the server's own
//! (relay channel) or one delegated by the caller (direct channel); this module does not
//! refresh or otherwise manage it.

use crate::traits::{CreatedFile, DocumentStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shelfcount_core::models::FolderHandle;
use std::time::Duration;
use uuid::Uuid;

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Drive-backed document store
#[derive(Clone)]
pub struct DriveStore {
    http_client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl DriveStore {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> StorageResult<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "Drive access token is empty".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    async fn list(&self, query: String) -> StorageResult<Vec<DriveFile>> {
        let response = self
            .http_client
            .get(self.files_url())
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("spaces", "drive"),
                ("orderBy", "createdTime"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, "list files").await?;
        let list: FileList = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Malformed file list: {}", e)))?;
        Ok(list.files)
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Map a non-success Drive status onto the storage taxonomy.
pub fn status_error(status: u16, context: &str, body: &str) -> StorageError {
    let detail = format!("{} failed with status {}: {}", context, status, body.trim());
    match status {
        401 | 403 => StorageError::PermissionDenied(detail),
        404 => StorageError::NotFound(detail),
        429 | 500..=599 => StorageError::Unavailable(detail),
        _ => StorageError::BackendError(detail),
    }
}

/// A fresh multipart boundary that does not occur anywhere in `data`.
pub fn multipart_boundary(data: &[u8]) -> String {
    loop {
        let boundary = format!("shelfcount_{}", Uuid::new_v4().simple());
        if !data
            .windows(boundary.len())
            .any(|window| window == boundary.as_bytes())
        {
            return boundary;
        }
    }
}

/// Build a `multipart/related` body carrying JSON metadata and the file bytes.
pub fn multipart_related_body(
    metadata: &serde_json::Value,
    content_type: &str,
    data: &[u8],
    boundary: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn transport_error(err: reqwest::Error) -> StorageError {
    StorageError::Unavailable(format!("Drive request failed: {}", err))
}

async fn check_status(response: reqwest::Response, context: &str) -> StorageResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), context, &body))
}

fn web_view_fallback(id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view", id)
}

#[async_trait]
impl DocumentStore for DriveStore {
    fn root(&self) -> FolderHandle {
        FolderHandle::new("root", "My Drive")
    }

    async fn find_folders(
        &self,
        parent: &FolderHandle,
        name: &str,
    ) -> StorageResult<Vec<FolderHandle>> {
        let query = format!(
            "name = '{}' and '{}' in parents and mimeType = '{}' and trashed = false",
            escape_query(name),
            escape_query(&parent.id),
            FOLDER_MIME_TYPE
        );
        let files = self.list(query).await?;
        Ok(files
            .into_iter()
            // Drive name matching is case-insensitive; callers need exact matches.
            .filter(|f| f.name == name)
            .map(|f| FolderHandle::new(f.id, f.name))
            .collect())
    }

    async fn create_folder(&self, parent: &FolderHandle, name: &str) -> StorageResult<FolderHandle> {
        let response = self
            .http_client
            .post(self.files_url())
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id,name")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent.id],
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, "create folder").await?;
        let created: DriveFile = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Malformed folder response: {}", e)))?;

        tracing::info!(folder_id = %created.id, name = %name, parent_id = %parent.id, "Drive folder created");
        Ok(FolderHandle::new(created.id, name))
    }

    async fn find_files(&self, folder: &FolderHandle, name: &str) -> StorageResult<Vec<String>> {
        let query = format!(
            "name = '{}' and '{}' in parents and trashed = false",
            escape_query(name),
            escape_query(&folder.id)
        );
        let files = self.list(query).await?;
        Ok(files
            .into_iter()
            .filter(|f| f.name == name)
            .map(|f| f.id)
            .collect())
    }

    async fn create_file(
        &self,
        folder: &FolderHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<CreatedFile> {
        let start = std::time::Instant::now();
        let size = data.len();
        let metadata = json!({
            "name": name,
            "parents": [folder.id],
            "mimeType": content_type,
        });
        let boundary = multipart_boundary(&data);
        let body = multipart_related_body(&metadata, content_type, &data, &boundary);

        let response = self
            .http_client
            .post(format!("{}/upload/drive/v3/files", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id,name,webViewLink")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, "upload file").await?;
        let created: DriveFile = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Malformed upload response: {}", e)))?;

        tracing::info!(
            file_id = %created.id,
            name = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive upload successful"
        );

        let web_view_url = created
            .web_view_link
            .unwrap_or_else(|| web_view_fallback(&created.id));
        Ok(CreatedFile {
            id: created.id,
            name: name.to_string(),
            web_view_url,
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> StorageResult<()> {
        let response = self
            .http_client
            .post(format!("{}/{}/permissions", self.files_url(), file_id))
            .bearer_auth(&self.access_token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response, "share file").await?;
        Ok(())
    }

    fn download_url(&self, file_id: &str) -> String {
        format!("https://drive.google.com/uc?id={}", file_id)
    }

    async fn ping(&self) -> StorageResult<()> {
        let response = self
            .http_client
            .get(format!("{}/drive/v3/about", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "user")])
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response, "about").await?;
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Drive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("O'Brien"), "O\\'Brien");
        assert_eq!(escape_query("a\\b"), "a\\\\b");
        assert_eq!(escape_query("สาขาในเมือง"), "สาขาในเมือง");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(401, "x", ""), StorageError::PermissionDenied(_)));
        assert!(matches!(status_error(403, "x", ""), StorageError::PermissionDenied(_)));
        assert!(matches!(status_error(404, "x", ""), StorageError::NotFound(_)));
        assert!(matches!(status_error(429, "x", ""), StorageError::Unavailable(_)));
        assert!(matches!(status_error(503, "x", ""), StorageError::Unavailable(_)));
        assert!(matches!(status_error(400, "x", ""), StorageError::BackendError(_)));
    }

    #[test]
    fn test_multipart_body_layout() {
        let metadata = json!({"name": "a.png"});
        let body = multipart_related_body(&metadata, "image/png", b"PNGDATA", "b0undary");
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--b0undary\r\n"));
        assert!(text.contains("{\"name\":\"a.png\"}"));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNGDATA"));
        assert!(text.ends_with("--b0undary--\r\n"));
    }

    #[test]
    fn test_boundary_is_fresh_and_absent_from_payload() {
        let first = multipart_boundary(b"PNGDATA");
        let second = multipart_boundary(b"PNGDATA");
        assert_ne!(first, second);

        // A payload carrying an earlier boundary verbatim still gets a distinct one.
        let payload = format!("\r\n--{}--\r\n", first).into_bytes();
        let boundary = multipart_boundary(&payload);
        assert_ne!(boundary, first);

        let body = multipart_related_body(&json!({}), "image/png", &payload, &boundary);
        let text = String::from_utf8_lossy(&body);
        assert_eq!(text.matches(boundary.as_str()).count(), 3);
    }

    #[test]
    fn test_download_url_depends_only_on_id() {
        let store = DriveStore::new("https://www.googleapis.com", "token").unwrap();
        assert_eq!(store.download_url("abc"), "https://drive.google.com/uc?id=abc");
        assert!(DriveStore::new("https://www.googleapis.com", " ").is_err());
    }
}
