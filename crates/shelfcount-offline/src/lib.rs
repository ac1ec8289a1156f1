//! Shelfcount Offline Runtime
//!
//! Client-side runtime that keeps the stock-count client usable on an unreliable
//! connection:
//!
//! - [`OfflineCacheManager`] keeps one versioned generation of static assets and sweeps
//!   every other generation when a new one activates.
//! - [`DeferredSubmissionQueue`] holds submissions made while offline and replays them in
//!   order on reconnect.
//! - [`ClientWorker`] owns both and exposes the lifecycle hooks (`on_install`,
//!   `on_activate`, `on_fetch`, `on_reconnect`).
//! - [`AcquisitionChain`] tries an ordered list of strategies until one yields a value.

pub mod acquisition;
pub mod cache;
pub mod client;
pub mod net;
pub mod queue;
pub mod worker;

pub use acquisition::{
    AcquisitionChain, AcquisitionError, AcquisitionState, AcquisitionStrategy, Acquired,
    CapturedPhoto, NewestImageInDir, PhotoFile,
};
pub use cache::{
    CacheError, CacheLifecycle, CacheStatus, CacheStore, FetchSource, FsCacheStore,
    MemoryCacheStore, OfflineCacheManager, ServedResponse, DEFAULT_DYNAMIC_PREFIXES,
    DEFAULT_GENERATION, DEFAULT_MANIFEST,
};
pub use client::{ClientError, StockClient};
pub use net::{HttpNetwork, Method, Network, NetworkError, Request, Response, ResponseKind};
pub use queue::{
    DeferredSubmissionQueue, FileQueueStore, MemoryQueueStore, QueueError, QueueStore,
    QueuedSubmission, ReplayReport, SubmitOutcome,
};
pub use worker::ClientWorker;
