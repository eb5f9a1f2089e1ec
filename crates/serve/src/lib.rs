//! Request-time serving.
//!
//! The resolver decides how each incoming path is answered — direct
//! stream, redirect to the edge store, conditional 304, or not-found —
//! as a pure function over the current registry snapshot. Requests
//! from different connections may land on different handler instances,
//! so nothing here holds per-request state.
//!
//! `live` carries the deployment-change WebSocket channel that powers
//! the "new version available" prompt.

pub mod live;
pub mod resolver;

pub use live::{LiveReloadConfig, LiveReloadServer};
pub use resolver::{CachePolicy, Resolution, Resolver, ResolverConfig};

/// Errors produced by the serving path.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry error: {0}")]
    Registry(#[from] statichost_registry::RegistryError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cdn asset but no cdn base url configured")]
    MissingCdnBase,
}
