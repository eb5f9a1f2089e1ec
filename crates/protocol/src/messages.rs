use serde::{Deserialize, Serialize};

use crate::types::{Asset, DeploymentInfo, UploadUrl};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Requests a batch of one-time upload URLs, sized to the file group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUploadUrlsRequest {
    pub count: u32,
}

/// Registers a single asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAssetRequest {
    pub asset: Asset,
}

/// Registers a batch of assets. Each path replace is individually
/// atomic; the batch as a whole is not one cross-path transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAssetsRequest {
    pub assets: Vec<Asset>,
}

/// Sweeps every asset not stamped with `current_deployment_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarbageCollectRequest {
    pub current_deployment_id: String,
}

/// Lists live assets, newest insertions last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Physically deletes released edge blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCdnBlobsRequest {
    pub blob_ids: Vec<String>,
}

/// Uploads raw bytes to the edge blob store.
///
/// The `data` field is base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCdnBlobRequest {
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Reply to [`GenerateUploadUrlsRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUploadUrlsResponse {
    pub urls: Vec<UploadUrl>,
}

/// Reply to [`RecordAssetRequest`] and [`RecordAssetsRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAssetsResponse {
    pub recorded: u64,
}

/// Reply to [`GarbageCollectRequest`].
///
/// `deleted` counts removed registry rows. `blob_ids` are the released
/// edge-store references; the caller deletes them via `delete_cdn_blobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarbageCollectResponse {
    pub deleted: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blob_ids: Vec<String>,
}

/// Reply to [`ListAssetsRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsResponse {
    pub assets: Vec<Asset>,
}

/// Reply to `get_current_deployment`. `deployment` is absent before
/// the first successful deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCurrentDeploymentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentInfo>,
}

/// Reply to [`DeleteCdnBlobsRequest`]. Counts blobs actually deleted;
/// missing blobs are skipped, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCdnBlobsResponse {
    pub deleted: u64,
}

/// Reply to [`UploadCdnBlobRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCdnBlobResponse {
    pub blob_id: String,
}

// ---------------------------------------------------------------------------
// Live-reload channel
// ---------------------------------------------------------------------------

/// Pushed to subscribers whenever the deployment pointer advances.
///
/// Clients compare `current_deployment_id` against the value captured
/// at their own session start; a mismatch means a newer generation
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentChangedEvent {
    pub current_deployment_id: String,
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// Serializes `Vec<u8>` as a base64 string in JSON.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
