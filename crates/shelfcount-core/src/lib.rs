//! Shelfcount Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Shelfcount component: the provisioning server, the upload channels and the
//! offline client runtime.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ProvisioningConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
