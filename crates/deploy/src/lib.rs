//! Site deploy flow: scan, upload, register, garbage-collect.
//!
//! This crate implements the **business logic** for deploying a built
//! site to the hosting backend. It is a library crate with no transport
//! dependencies — the CLI provides a [`DeployClient`] implementation
//! that bridges to the actual entry-point calls.
//!
//! # Pipeline
//!
//! 1. **Scan** — recursively walk the site directory
//! 2. **Partition** — non-HTML files route to the edge store in CDN mode
//! 3. **Upload** — bounded-parallel byte transfers against one-time URLs
//! 4. **Register** — batch for block entries, individual for CDN entries
//! 5. **Finalize** — garbage-collect the prior generation, then delete
//!    released edge blobs
//!
//! The whole set is registered before anything is swept; a failure at
//! any earlier step leaves the previous generation fully servable.

pub mod client;
pub mod content_type;
pub mod deploy;
pub mod error;
pub mod scanner;
pub mod types;
mod uploader;

pub use client::{ClientFuture, DeployClient};
pub use content_type::content_type_for;
pub use deploy::DeployOrchestrator;
pub use error::DeployError;
pub use scanner::scan_site;
pub use types::{DEFAULT_CONCURRENCY, DeployEvent, DeployOptions, DeployReport, SiteFile};
