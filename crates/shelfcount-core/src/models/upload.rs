use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::media::StoredFileDescriptor;

/// Result of one channel's attempt within an orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOutcome {
    pub channel: String,
    pub success: bool,
    pub descriptor: Option<StoredFileDescriptor>,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn succeeded(channel: impl Into<String>, descriptor: StoredFileDescriptor) -> Self {
        Self {
            channel: channel.into(),
            success: true,
            descriptor: Some(descriptor),
            error: None,
        }
    }

    pub fn failed(channel: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            success: false,
            descriptor: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of every channel outcome for one upload request.
///
/// Only constructible from the outcomes themselves, so `overall_success` always agrees
/// with `successful_channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    overall_success: bool,
    successful_channels: Vec<String>,
    summary: String,
    outcomes: Vec<ChannelOutcome>,
}

impl UploadReport {
    /// Build a report, preserving the order in which channels were configured.
    pub fn from_outcomes(outcomes: Vec<ChannelOutcome>) -> Self {
        let successful_channels: Vec<String> = outcomes
            .iter()
            .filter(|o| o.success)
            .map(|o| o.channel.clone())
            .collect();
        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.channel.as_str())
            .collect();

        let summary = if outcomes.is_empty() {
            "No upload channels configured".to_string()
        } else if failed.is_empty() {
            format!("Uploaded via {}", successful_channels.join(", "))
        } else if successful_channels.is_empty() {
            format!("Upload failed on all channels: {}", failed.join(", "))
        } else {
            format!(
                "Uploaded via {}; failed: {}",
                successful_channels.join(", "),
                failed.join(", ")
            )
        };

        Self {
            overall_success: !successful_channels.is_empty(),
            successful_channels,
            summary,
            outcomes,
        }
    }

    pub fn overall_success(&self) -> bool {
        self.overall_success
    }

    pub fn successful_channels(&self) -> &[String] {
        &self.successful_channels
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn outcomes(&self) -> &[ChannelOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, channel: &str) -> Option<&ChannelOutcome> {
        self.outcomes.iter().find(|o| o.channel == channel)
    }
}

/// Provisioning entry point request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub folder: String,
}

/// Provisioning entry point response body. On failure only `success` and `error` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProvisionResponse {
    pub fn stored(folder: impl Into<String>, descriptor: &StoredFileDescriptor) -> Self {
        Self {
            success: true,
            file_id: Some(descriptor.file_id.clone()),
            filename: Some(descriptor.file_name.clone()),
            web_view_link: Some(descriptor.web_view_url.clone()),
            download_link: Some(descriptor.download_url.clone()),
            folder: Some(folder.into()),
            folder_id: Some(descriptor.folder_id.clone()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Recover the descriptor from a successful response.
    pub fn descriptor(&self) -> Option<StoredFileDescriptor> {
        if !self.success {
            return None;
        }
        let file_id = self.file_id.clone()?;
        Some(StoredFileDescriptor {
            file_name: self.filename.clone().unwrap_or_default(),
            folder_id: self.folder_id.clone().unwrap_or_default(),
            download_url: self.download_link.clone().unwrap_or_default(),
            web_view_url: self.web_view_link.clone().unwrap_or_default(),
            file_id,
        })
    }
}

fn default_branch() -> String {
    "CITY".to_string()
}

/// Orchestrator test entry point request body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadTestRequest {
    pub image_data: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Per-channel detail in an orchestrator response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChannelResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrator test entry point response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadTestResponse {
    pub success: bool,
    pub successful_methods: Vec<String>,
    pub summary: String,
    pub results: BTreeMap<String, ChannelResult>,
}

impl From<&UploadReport> for UploadTestResponse {
    fn from(report: &UploadReport) -> Self {
        let results = report
            .outcomes()
            .iter()
            .map(|o| {
                (
                    o.channel.clone(),
                    ChannelResult {
                        success: o.success,
                        url: o.descriptor.as_ref().map(|d| d.web_view_url.clone()),
                        error: o.error.clone(),
                    },
                )
            })
            .collect();

        Self {
            success: report.overall_success(),
            successful_methods: report.successful_channels().to_vec(),
            summary: report.summary().to_string(),
            results,
        }
    }
}

/// Delegated-credential status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DriveStatusResponse {
    pub authorized: bool,
    pub message: String,
}
