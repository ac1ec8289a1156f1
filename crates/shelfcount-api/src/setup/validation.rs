//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use shelfcount_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.channel_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("CHANNEL_TIMEOUT_SECS must be greater than 0"));
    }

    if config.relay_url().is_some() && !config.upload_channels().iter().any(|c| c == "relay") {
        tracing::warn!("RELAY_URL is set but the relay channel is not enabled in UPLOAD_CHANNELS");
    }

    if !config.strict_folder_resolution() {
        tracing::debug!(
            "Folder resolution is not serialized; concurrent uploads to a new folder may create duplicates"
        );
    }

    Ok(())
}
