//! Shelfcount Processing Library
//!
//! Turns transport-encoded image payloads into [`MediaPayload`](shelfcount_core::models::MediaPayload)s
//! and checks them against the configured size limits before anything is written.

pub mod ingest;
pub mod validator;

pub use ingest::{
    content_type_for_name, data_uri_media_type, extension_for_media_type, IngestError,
    MediaIngestor,
};
pub use validator::{MediaValidator, ValidationError};
