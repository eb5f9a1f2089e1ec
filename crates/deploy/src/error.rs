//! Deploy error types.

/// Errors produced during a site deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("cancelled")]
    Cancelled,
}
