//! Shelfcount Storage Library
//!
//! This crate provides the document-storage abstraction and the provisioning primitives
//! built on top of it.
//!
//! # Folder model
//!
//! Backends expose a Drive-like hierarchy: folders are found by exact (case-sensitive)
//! name under a parent, and two siblings may share a name. Files are written into a
//! folder, made readable by anyone holding the link, and addressed by a backend id.
//!
//! - [`PathResolver`] walks a `LogicalPath`, reusing or creating each folder.
//! - [`CollisionSafeNamer`] picks a name that does not clash inside a folder.
//! - [`StorageWriter`] writes a payload and returns its `StoredFileDescriptor`.

#[cfg(feature = "storage-drive")]
pub mod drive;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod naming;
pub mod resolver;
pub mod traits;
pub mod writer;

// Re-export commonly used types
#[cfg(feature = "storage-drive")]
pub use drive::DriveStore;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStore;
pub use memory::{InjectedFailure, MemoryStore, StoreOperation};
pub use naming::{Clock, CollisionSafeNamer, FixedClock, SystemClock};
pub use resolver::PathResolver;
pub use shelfcount_core::StorageBackend;
pub use traits::{CreatedFile, DocumentStore, StorageError, StorageResult};
pub use writer::StorageWriter;
