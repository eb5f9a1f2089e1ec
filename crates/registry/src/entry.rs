//! Named entry points consumed by the deploy CLI.
//!
//! Every CLI call arrives as an envelope [`Message`] and is dispatched
//! by function name; the CLI never touches the document store or the
//! blob backends directly. Replies preserve the call id.

use tracing::{info, warn};

use statichost_protocol::envelope::Message;
use statichost_protocol::functions::FunctionName;
use statichost_protocol::messages::{
    DeleteCdnBlobsRequest, DeleteCdnBlobsResponse, GarbageCollectRequest, GarbageCollectResponse,
    GenerateUploadUrlsRequest, GenerateUploadUrlsResponse, GetCurrentDeploymentResponse,
    ListAssetsRequest, ListAssetsResponse, RecordAssetRequest, RecordAssetsRequest,
    RecordAssetsResponse, UploadCdnBlobRequest, UploadCdnBlobResponse,
};
use statichost_protocol::types::StorageRef;
use statichost_storage::{BlockStore, CdnStore};

use crate::pointer::DeploymentTracker;
use crate::registry::AssetRegistry;
use crate::store::AssetStore;

/// Server-side dispatcher for the registered entry points.
pub struct EntryPoints<S, B, C> {
    registry: AssetRegistry<S>,
    tracker: DeploymentTracker,
    blocks: B,
    cdn: C,
}

impl<S: AssetStore, B: BlockStore, C: CdnStore> EntryPoints<S, B, C> {
    pub fn new(registry: AssetRegistry<S>, tracker: DeploymentTracker, blocks: B, cdn: C) -> Self {
        Self {
            registry,
            tracker,
            blocks,
            cdn,
        }
    }

    pub fn registry(&self) -> &AssetRegistry<S> {
        &self.registry
    }

    pub fn tracker(&self) -> &DeploymentTracker {
        &self.tracker
    }

    /// Dispatches one call and produces its reply.
    pub async fn handle(&self, msg: Message) -> Message {
        let result = match msg.function {
            FunctionName::GenerateUploadUrls => self.generate_upload_urls(&msg).await,
            FunctionName::RecordAsset => self.record_asset(&msg).await,
            FunctionName::RecordAssets => self.record_assets(&msg).await,
            FunctionName::GarbageCollect => self.garbage_collect(&msg).await,
            FunctionName::ListAssets => self.list_assets(&msg).await,
            FunctionName::GetCurrentDeployment => self.get_current_deployment(&msg).await,
            FunctionName::DeleteCdnBlobs => self.delete_cdn_blobs(&msg).await,
            FunctionName::UploadCdnBlob => self.upload_cdn_blob(&msg).await,
            FunctionName::FunctionResult | FunctionName::DeploymentChanged | FunctionName::Error => {
                return msg.reply_error(400, "not a callable function");
            }
        };

        match result {
            Ok(reply) => reply,
            Err(e) => msg.reply_error(500, e.to_string()),
        }
    }

    async fn generate_upload_urls(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: GenerateUploadUrlsRequest = parse_required(msg)?;
        let urls = self.blocks.generate_upload_urls(req.count).await?;
        let resp = GenerateUploadUrlsResponse { urls };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn record_asset(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: RecordAssetRequest = parse_required(msg)?;
        let asset = req.asset;

        info!(path = %asset.path, deployment = %asset.deployment_id, "asset recorded");
        let old = self
            .registry
            .upsert(
                &asset.path,
                asset.storage_ref,
                &asset.content_type,
                &asset.deployment_id,
            )
            .await?;
        if let Some(replaced) = old {
            self.release_ref(&replaced).await;
        }

        let resp = RecordAssetsResponse { recorded: 1 };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn record_assets(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: RecordAssetsRequest = parse_required(msg)?;
        let count = req.assets.len() as u64;

        info!(count, "asset batch recorded");
        let replaced = self.registry.batch_upsert(req.assets).await?;
        for old in &replaced {
            self.release_ref(old).await;
        }

        let resp = RecordAssetsResponse { recorded: count };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    /// The finalize mutation: sweep stale generations, advance the
    /// pointer, release swept block storage. Released CDN refs go back
    /// to the caller for `delete_cdn_blobs`.
    async fn garbage_collect(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: GarbageCollectRequest = parse_required(msg)?;
        let outcome = self.registry.sweep(&req.current_deployment_id).await?;

        // The pointer advances once the sweep has committed; physical
        // deletes below are non-fatal and never roll it back.
        let info = self
            .registry
            .advance_pointer(&req.current_deployment_id)
            .await?;
        self.tracker.publish(info);

        for storage_id in &outcome.released_blob_refs {
            if let Err(e) = self.blocks.delete(storage_id).await {
                warn!(storage_id = %storage_id, error = %e, "failed to delete swept blob");
            }
        }

        info!(
            deployment = %req.current_deployment_id,
            deleted = outcome.deleted(),
            "garbage collect complete"
        );

        let resp = GarbageCollectResponse {
            deleted: outcome.deleted(),
            blob_ids: outcome.released_cdn_refs,
        };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn list_assets(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: ListAssetsRequest = match msg.parse_payload()? {
            Some(req) => req,
            None => ListAssetsRequest { limit: None },
        };
        let assets = self
            .registry
            .list(req.limit.map(|l| l as usize))
            .await?;
        let resp = ListAssetsResponse { assets };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn get_current_deployment(&self, msg: &Message) -> Result<Message, HandlerError> {
        let deployment = self.registry.current_deployment().await?;
        let resp = GetCurrentDeploymentResponse { deployment };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn delete_cdn_blobs(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: DeleteCdnBlobsRequest = parse_required(msg)?;
        let mut deleted = 0u64;
        for blob_id in &req.blob_ids {
            match self.cdn.delete(blob_id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(blob_id = %blob_id, error = %e, "failed to delete cdn blob");
                }
            }
        }
        let resp = DeleteCdnBlobsResponse { deleted };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    async fn upload_cdn_blob(&self, msg: &Message) -> Result<Message, HandlerError> {
        let req: UploadCdnBlobRequest = parse_required(msg)?;
        let blob_id = self.cdn.upload(req.data, &req.content_type).await?;
        let resp = UploadCdnBlobResponse { blob_id };
        Ok(msg.reply(FunctionName::FunctionResult, Some(&resp))?)
    }

    /// Physically deletes a replaced reference, whichever backend owns
    /// it. Failures are cleanup costs, not call failures.
    async fn release_ref(&self, replaced: &StorageRef) {
        let result = match replaced {
            StorageRef::Blob { storage_id } => self.blocks.delete(storage_id).await,
            StorageRef::Cdn { blob_id } => self.cdn.delete(blob_id).await,
        };
        if let Err(e) = result {
            warn!(id = %replaced.id(), error = %e, "failed to release replaced ref");
        }
    }
}

/// Internal error type for handlers; always rendered as an error reply.
#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error("missing payload")]
    MissingPayload,

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Registry(#[from] crate::RegistryError),

    #[error("{0}")]
    Storage(#[from] statichost_storage::StorageError),
}

fn parse_required<T: for<'de> serde::Deserialize<'de>>(msg: &Message) -> Result<T, HandlerError> {
    msg.parse_payload()?.ok_or(HandlerError::MissingPayload)
}
