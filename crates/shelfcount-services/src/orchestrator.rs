//! Multi-channel upload orchestration
//!
//! The payload is decoded once, before any channel runs; a decoding failure aborts the
//! whole upload. After that every channel is attempted, concurrently and each under its own
//! timeout, and every outcome lands in the report. A channel that times out is simply not
//! awaited further; whatever it already wrote stays written.

use crate::branches::BranchFolders;
use crate::channels::{ChannelUpload, UploadChannel};
use chrono::{TimeZone, Utc};
use futures::future::join_all;
use shelfcount_core::models::{ChannelOutcome, UploadReport};
use shelfcount_core::{AppError, ErrorMetadata};
use shelfcount_processing::{
    data_uri_media_type, extension_for_media_type, MediaIngestor, MediaValidator,
};
use shelfcount_storage::{Clock, SystemClock};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// `stock_test_<YYYYmmdd_HHMMSS>.<ext>`, with the extension taken from the data URI.
pub fn test_upload_file_name(encoded: &str, now_millis: i64) -> String {
    let extension = data_uri_media_type(encoded)
        .map(extension_for_media_type)
        .unwrap_or("jpg");
    let stamp = Utc
        .timestamp_millis_opt(now_millis)
        .single()
        .unwrap_or_else(Utc::now)
        .format("%Y%m%d_%H%M%S");
    format!("stock_test_{}.{}", stamp, extension)
}

pub struct UploadOrchestrator {
    channels: Vec<Arc<dyn UploadChannel>>,
    branches: BranchFolders,
    ingestor: MediaIngestor,
    validator: MediaValidator,
    channel_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl UploadOrchestrator {
    pub fn new(
        channels: Vec<Arc<dyn UploadChannel>>,
        branches: BranchFolders,
        validator: MediaValidator,
        channel_timeout: Duration,
    ) -> Self {
        Self {
            channels,
            branches,
            ingestor: MediaIngestor::new(),
            validator,
            channel_timeout,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    /// Upload one encoded image for `branch` through every configured channel.
    #[tracing::instrument(skip(self, encoded), fields(branch = %branch, channels = self.channels.len()))]
    pub async fn upload(&self, branch: &str, encoded: &str) -> Result<UploadReport, AppError> {
        if encoded.trim().is_empty() {
            return Err(AppError::InvalidInput("image_data is required".to_string()));
        }

        let file_name = test_upload_file_name(encoded, self.clock.now_millis());
        self.validator.validate_encoded_len(encoded.len())?;
        let payload = self.ingestor.ingest(encoded, &file_name)?;
        self.validator.validate(&payload)?;

        let upload = ChannelUpload {
            path: self.branches.path_for(branch),
            file_name,
            payload,
            encoded: encoded.to_string(),
        };

        let attempts = self
            .channels
            .iter()
            .map(|channel| self.attempt(channel.as_ref(), &upload));
        let outcomes = join_all(attempts).await;

        let report = UploadReport::from_outcomes(outcomes);
        tracing::info!(
            path = %upload.path,
            file_name = %upload.file_name,
            overall_success = report.overall_success(),
            summary = %report.summary(),
            "Upload orchestration finished"
        );
        Ok(report)
    }

    async fn attempt(&self, channel: &dyn UploadChannel, upload: &ChannelUpload) -> ChannelOutcome {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.channel_timeout, channel.upload(upload)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::StorageUnavailable(format!(
                "channel timed out after {}s",
                self.channel_timeout.as_secs_f64()
            ))),
        };

        match result {
            Ok(descriptor) => {
                tracing::debug!(
                    channel = %channel.name(),
                    file_id = %descriptor.file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Channel upload succeeded"
                );
                ChannelOutcome::succeeded(channel.name(), descriptor)
            }
            Err(err) => {
                tracing::warn!(
                    channel = %channel.name(),
                    error = %err,
                    recoverable = err.is_recoverable(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Channel upload failed"
                );
                ChannelOutcome::failed(channel.name(), err.client_message())
            }
        }
    }
}
