//! The remote-function seam between the deploy flow and the backend.
//!
//! `DeployClient` is implemented by the CLI on top of whatever
//! transport reaches the named entry points. Using a trait keeps the
//! deploy logic decoupled from transport and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use statichost_protocol::messages::GarbageCollectResponse;
use statichost_protocol::types::{Asset, DeploymentInfo, UploadUrl};

use crate::error::DeployError;

/// A boxed future returned by client methods.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DeployError>> + Send + 'a>>;

/// Abstract connection to the hosting backend's entry points.
pub trait DeployClient: Send + Sync {
    /// Requests a batch of one-time block-storage upload URLs.
    fn generate_upload_urls(&self, count: u32) -> ClientFuture<'_, Vec<UploadUrl>>;

    /// Uploads raw bytes against a one-time URL, bypassing the
    /// registry entirely. Returns the storage id.
    fn upload_block(&self, url: &UploadUrl, data: Vec<u8>) -> ClientFuture<'_, String>;

    /// Uploads raw bytes to the edge blob store. Returns the blob id.
    fn upload_cdn_blob(&self, data: Vec<u8>, content_type: &str) -> ClientFuture<'_, String>;

    /// Registers a single asset (edge-store entries flush this way).
    fn record_asset(&self, asset: Asset) -> ClientFuture<'_, ()>;

    /// Registers a batch of assets in one round trip.
    fn record_assets(&self, assets: Vec<Asset>) -> ClientFuture<'_, u64>;

    /// Sweeps every generation except `current_deployment_id` and
    /// advances the deployment pointer.
    fn garbage_collect(
        &self,
        current_deployment_id: &str,
    ) -> ClientFuture<'_, GarbageCollectResponse>;

    /// Physically deletes released edge blobs.
    fn delete_cdn_blobs(&self, blob_ids: Vec<String>) -> ClientFuture<'_, u64>;

    /// Reads the deployment pointer.
    fn get_current_deployment(&self) -> ClientFuture<'_, Option<DeploymentInfo>>;
}
