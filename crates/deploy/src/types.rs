//! Data types for the deploy flow.

use std::path::PathBuf;

/// Default upload worker-pool width.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Configuration for one deploy invocation.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Root of the built site (the bundler's output directory).
    pub site_dir: PathBuf,
    /// Route non-HTML files to the edge blob store.
    pub cdn_enabled: bool,
    /// Maximum transfers in flight at once.
    pub concurrency: usize,
}

impl DeployOptions {
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
            cdn_enabled: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// One local file slated for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Path relative to the site root, `/`-separated.
    pub relative_path: String,
    /// Absolute URL path the file will be served under (leading `/`).
    pub url_path: String,
    pub size: i64,
}

/// Progress event emitted during a deploy.
#[derive(Debug, Clone)]
pub enum DeployEvent {
    Progress { progress: f64, status: String },
    Completed { deployment_id: String },
    Failed { error: String },
}

/// Result of a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// The generation every uploaded asset was stamped with.
    pub deployment_id: String,
    /// Files transferred and registered.
    pub uploaded: usize,
    /// Registry rows removed by the sweep.
    pub swept: u64,
    /// Edge blobs physically deleted after the sweep.
    pub cdn_blobs_deleted: u64,
}
