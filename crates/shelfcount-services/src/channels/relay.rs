use super::{ChannelUpload, UploadChannel};
use crate::provisioner::Provisioner;
use async_trait::async_trait;
use shelfcount_core::models::StoredFileDescriptor;
use shelfcount_core::AppError;

#[cfg(feature = "relay-remote")]
use shelfcount_core::models::{ProvisionRequest, ProvisionResponse};
#[cfg(feature = "relay-remote")]
use std::time::Duration;

pub const RELAY_CHANNEL: &str = "relay";

enum RelayMode {
    InProcess(Provisioner),
    #[cfg(feature = "relay-remote")]
    Remote {
        http_client: reqwest::Client,
        url: String,
    },
}

/// Stores through the server's own credentials, either in-process or by forwarding the
/// upload to a remote provisioning endpoint.
pub struct RelayChannel {
    mode: RelayMode,
}

impl RelayChannel {
    pub fn in_process(provisioner: Provisioner) -> Self {
        Self {
            mode: RelayMode::InProcess(provisioner),
        }
    }

    #[cfg(feature = "relay-remote")]
    pub fn remote(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for relay channel")?;
        Ok(Self {
            mode: RelayMode::Remote {
                http_client,
                url: url.into(),
            },
        })
    }

    #[cfg(feature = "relay-remote")]
    async fn forward(
        http_client: &reqwest::Client,
        url: &str,
        upload: &ChannelUpload,
    ) -> Result<StoredFileDescriptor, AppError> {
        let request = ProvisionRequest {
            image_data: upload.encoded.clone(),
            filename: upload.file_name.clone(),
            folder: upload.path.to_string(),
        };

        let response = http_client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("relay endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body: ProvisionResponse = response.json().await.map_err(|e| {
            AppError::StorageUnavailable(format!(
                "relay endpoint returned an unreadable response ({}): {}",
                status, e
            ))
        })?;

        if let Some(descriptor) = body.descriptor() {
            return Ok(descriptor);
        }

        let message = body
            .error
            .unwrap_or_else(|| format!("relay endpoint answered {}", status));
        Err(match status.as_u16() {
            400 => AppError::InvalidEncoding(message),
            401 | 403 => AppError::PermissionDenied(message),
            _ => AppError::StorageUnavailable(message),
        })
    }
}

#[async_trait]
impl UploadChannel for RelayChannel {
    fn name(&self) -> &str {
        RELAY_CHANNEL
    }

    async fn upload(&self, upload: &ChannelUpload) -> Result<StoredFileDescriptor, AppError> {
        match &self.mode {
            RelayMode::InProcess(provisioner) => {
                provisioner
                    .store_payload(&upload.path, upload.payload.clone(), &upload.file_name)
                    .await
            }
            #[cfg(feature = "relay-remote")]
            RelayMode::Remote { http_client, url } => Self::forward(http_client, url, upload).await,
        }
    }
}
