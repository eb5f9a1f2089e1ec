use serde::{Deserialize, Serialize};

/// Named entry points exposed to the deploy CLI.
///
/// The CLI never reaches the document store or the blob backends
/// directly; every call goes through one of these access-controlled
/// functions. `FunctionResult`, `DeploymentChanged` and `Error` are
/// server-to-client envelope types, not callable functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    /// Batch of one-time block-storage upload grants, sized by count.
    GenerateUploadUrls,
    /// Register a single asset (used for edge-store entries).
    RecordAsset,
    /// Register a batch of assets in one round trip.
    RecordAssets,
    /// Sweep stale generations and advance the deployment pointer.
    GarbageCollect,
    /// Diagnostic enumeration of live assets.
    ListAssets,
    GetCurrentDeployment,
    /// Physically delete edge blobs released by a sweep.
    DeleteCdnBlobs,
    /// Upload raw bytes to the edge blob store.
    UploadCdnBlob,

    /// Successful reply to any of the above.
    FunctionResult,
    /// Push notification on the live-reload channel.
    DeploymentChanged,
    /// Error reply.
    Error,
}
