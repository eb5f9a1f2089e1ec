//! Asset registry: the mapping from URL path to servable asset.
//!
//! The registry owns three things:
//! - per-path atomic replace (`upsert`) so readers never observe a
//!   path with zero or two live rows,
//! - generation-scoped garbage collection (`sweep`) keyed by
//!   deployment id,
//! - the deployment pointer singleton and its change broadcast.
//!
//! The document store itself is the host platform's; this crate talks
//! to it through the [`AssetStore`] trait and ships an in-memory
//! implementation for local development and tests.

pub mod entry;
pub mod pointer;
pub mod registry;
pub mod store;

pub use entry::EntryPoints;
pub use pointer::DeploymentTracker;
pub use registry::{AssetRegistry, SweepOutcome};
pub use store::{AssetStore, MemoryAssetStore, StoreFuture};

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("document store error: {0}")]
    Store(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] statichost_storage::StorageError),
}
