//! Configuration module
//!
//! This module provides configuration structures for the provisioning server: storage
//! backend selection, branch folder layout, upload channels and size limits.

use std::collections::BTreeMap;
use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 5000;
const HTTP_CONCURRENCY_LIMIT: usize = 1000;
const MAX_IMAGE_SIZE_MB: usize = 10;
const CHANNEL_TIMEOUT_SECS: u64 = 30;
const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";
const UPLOAD_ROOT_FOLDER: &str = "Check Stock Project";
const BRANCH_FOLDERS: &str = "CITY=สาขาตัวเมือง,SCHOOL=สาขาหน้าโรงเรียน,PONGPAI=สาขาโป่งไผ่";
const UPLOAD_CHANNELS: &str = "relay,direct";

/// Base HTTP server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub environment: String,
}

/// Provisioning server configuration
#[derive(Clone, Debug)]
pub struct ProvisioningConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub drive_api_base_url: String,
    pub drive_access_token: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Folder layout
    pub upload_root_folder: String,
    pub branch_folders: BTreeMap<String, String>,
    // Upload behavior
    pub max_image_size_bytes: usize,
    pub upload_channels: Vec<String>,
    pub relay_url: Option<String>,
    pub channel_timeout_secs: u64,
    /// Serialize folder resolution per logical path inside this process.
    pub strict_folder_resolution: bool,
}

/// Application configuration (provisioning server).
#[derive(Clone, Debug)]
pub struct Config(pub Box<ProvisioningConfig>);

impl Config {
    fn as_provisioning(&self) -> &ProvisioningConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_provisioning().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ProvisioningConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_provisioning().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_provisioning().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_provisioning().base.cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_provisioning().base.http_concurrency_limit
    }

    pub fn environment(&self) -> &str {
        &self.as_provisioning().base.environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_provisioning().storage_backend
    }

    pub fn drive_api_base_url(&self) -> &str {
        &self.as_provisioning().drive_api_base_url
    }

    pub fn drive_access_token(&self) -> Option<&str> {
        self.as_provisioning().drive_access_token.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_provisioning().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_provisioning().local_storage_base_url.as_deref()
    }

    pub fn upload_root_folder(&self) -> &str {
        &self.as_provisioning().upload_root_folder
    }

    pub fn branch_folders(&self) -> &BTreeMap<String, String> {
        &self.as_provisioning().branch_folders
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.as_provisioning().max_image_size_bytes
    }

    pub fn upload_channels(&self) -> &[String] {
        &self.as_provisioning().upload_channels
    }

    pub fn relay_url(&self) -> Option<&str> {
        self.as_provisioning().relay_url.as_deref()
    }

    pub fn channel_timeout_secs(&self) -> u64 {
        self.as_provisioning().channel_timeout_secs
    }

    pub fn strict_folder_resolution(&self) -> bool {
        self.as_provisioning().strict_folder_resolution
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse `CODE=Folder Name,CODE2=Other` into a map. Entries without `=` are skipped.
pub fn parse_branch_folders(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (code, folder) = entry.split_once('=')?;
            let code = code.trim();
            let folder = folder.trim();
            if code.is_empty() || folder.is_empty() {
                return None;
            }
            Some((code.to_string(), folder.to_string()))
        })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ProvisioningConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Memory,
        };

        let max_image_size_mb = env::var("MAX_IMAGE_SIZE_MB")
            .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_IMAGE_SIZE_MB);

        let config = ProvisioningConfig {
            base,
            storage_backend,
            drive_api_base_url: env::var("DRIVE_API_BASE_URL")
                .unwrap_or_else(|_| DRIVE_API_BASE_URL.to_string()),
            drive_access_token: env::var("DRIVE_ACCESS_TOKEN").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload_root_folder: env::var("UPLOAD_ROOT_FOLDER")
                .unwrap_or_else(|_| UPLOAD_ROOT_FOLDER.to_string()),
            branch_folders: parse_branch_folders(
                &env::var("BRANCH_FOLDERS").unwrap_or_else(|_| BRANCH_FOLDERS.to_string()),
            ),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            upload_channels: parse_list(
                &env::var("UPLOAD_CHANNELS").unwrap_or_else(|_| UPLOAD_CHANNELS.to_string()),
            ),
            relay_url: env::var("RELAY_URL").ok().filter(|s| !s.trim().is_empty()),
            channel_timeout_secs: env::var("CHANNEL_TIMEOUT_SECS")
                .unwrap_or_else(|_| CHANNEL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CHANNEL_TIMEOUT_SECS),
            strict_folder_resolution: env::var("STRICT_FOLDER_RESOLUTION")
                .map(|v| parse_bool(&v, false))
                .unwrap_or(false),
        };

        Ok(config)
    }

    /// Configuration suitable for tests and local development: in-memory storage,
    /// default branch layout, both channels enabled.
    pub fn development() -> Self {
        ProvisioningConfig {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
                environment: "development".to_string(),
            },
            storage_backend: StorageBackend::Memory,
            drive_api_base_url: DRIVE_API_BASE_URL.to_string(),
            drive_access_token: None,
            local_storage_path: None,
            local_storage_base_url: None,
            upload_root_folder: UPLOAD_ROOT_FOLDER.to_string(),
            branch_folders: parse_branch_folders(BRANCH_FOLDERS),
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            upload_channels: parse_list(UPLOAD_CHANNELS),
            relay_url: None,
            channel_timeout_secs: CHANNEL_TIMEOUT_SECS,
            strict_folder_resolution: false,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::Drive => {
                if self.drive_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "DRIVE_ACCESS_TOKEN must be set when STORAGE_BACKEND=drive"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        if self.upload_channels.is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_CHANNELS must name at least one channel"));
        }

        for (i, channel) in self.upload_channels.iter().enumerate() {
            if channel != "relay" && channel != "direct" {
                return Err(anyhow::anyhow!(
                    "Unknown upload channel '{}'. Supported: relay, direct",
                    channel
                ));
            }
            // Reports are keyed by channel name
            if self.upload_channels[..i].contains(channel) {
                return Err(anyhow::anyhow!(
                    "Upload channel '{}' is listed more than once in UPLOAD_CHANNELS",
                    channel
                ));
            }
        }

        if self.max_image_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be greater than 0"));
        }

        if self.channel_timeout_secs == 0 {
            return Err(anyhow::anyhow!("CHANNEL_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_branch_folders() {
        let map = parse_branch_folders("CITY=Town Branch, SCHOOL = School Branch ,broken,=x");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("CITY").map(String::as_str), Some("Town Branch"));
        assert_eq!(map.get("SCHOOL").map(String::as_str), Some("School Branch"));
    }

    #[test]
    fn test_development_config_is_valid() {
        let config = ProvisioningConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.upload_channels, vec!["relay", "direct"]);
        assert_eq!(config.branch_folders.len(), 3);
    }

    #[test]
    fn test_validate_rejects_unknown_channel() {
        let mut config = ProvisioningConfig::development();
        config.upload_channels = vec!["relay".to_string(), "carrier-pigeon".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_validate_rejects_duplicate_channel() {
        let mut config = ProvisioningConfig::development();
        config.upload_channels = parse_list("relay, Relay");
        assert_eq!(config.upload_channels, vec!["relay", "relay"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        config.upload_channels = parse_list("direct,relay");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_drive_token() {
        let mut config = ProvisioningConfig::development();
        config.storage_backend = StorageBackend::Drive;
        assert!(config.validate().is_err());
        config.drive_access_token = Some("token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
    }
}
