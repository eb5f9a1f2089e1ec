use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to the stored bytes of an asset.
///
/// A closed sum type: exactly one variant is ever populated. Non-HTML
/// assets may live in the edge blob store when CDN mode is enabled;
/// everything else lives in platform block storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StorageRef {
    /// Platform block storage, addressed by storage id.
    #[serde(rename_all = "camelCase")]
    Blob { storage_id: String },
    /// Edge blob store, addressed by blob id and served via redirect.
    #[serde(rename_all = "camelCase")]
    Cdn { blob_id: String },
}

impl StorageRef {
    /// Returns the backend-specific identifier, whichever variant this is.
    pub fn id(&self) -> &str {
        match self {
            StorageRef::Blob { storage_id } => storage_id,
            StorageRef::Cdn { blob_id } => blob_id,
        }
    }

    /// Returns `true` for edge blob store references.
    pub fn is_cdn(&self) -> bool {
        matches!(self, StorageRef::Cdn { .. })
    }
}

/// One registry row: a URL path mapped to its servable bytes.
///
/// At most one live row exists per `path`. The `deployment_id` stamps
/// the generation that uploaded the row; rows from other generations
/// are removed by the garbage-collect sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Absolute URL path with a leading `/`. Unique key.
    pub path: String,
    /// MIME type computed from the file extension at upload time.
    pub content_type: String,
    pub storage_ref: StorageRef,
    pub deployment_id: String,
}

/// The singleton pointer to the generation currently considered live.
///
/// Created on the first successful deploy, updated (never deleted) on
/// every one after that. Single-writer: only the finalize step of a
/// deploy advances it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub current_deployment_id: String,
    pub deployed_at: DateTime<Utc>,
}

/// A one-time grant for uploading raw bytes to block storage.
///
/// The token is consumed by the first upload against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrl {
    pub token: String,
    pub url: String,
}
