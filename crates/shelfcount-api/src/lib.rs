//! Shelfcount API Library
//!
//! This crate provides the HTTP handlers and application setup for the provisioning
//! server.

// Module declarations
mod api_doc;
mod handlers;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError, ValidatedJson};
pub use state::AppState;
