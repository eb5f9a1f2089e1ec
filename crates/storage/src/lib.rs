//! Storage backend interfaces.
//!
//! The host platform provides two byte stores: block storage (primary,
//! read by the serving path) and an edge blob store (public delivery
//! via redirect). The core only sees the two traits defined here; the
//! in-memory implementations back local development and tests.

mod block;
mod cdn;
mod digest;

pub use block::{BlockStore, MemoryBlockStore};
pub use cdn::{CdnStore, MemoryCdnStore};
pub use digest::content_digest;

use std::future::Future;
use std::pin::Pin;

/// A boxed future returned by storage trait methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors produced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown upload token: {0}")]
    UnknownToken(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}
