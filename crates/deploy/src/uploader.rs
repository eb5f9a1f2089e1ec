//! Bounded-parallel byte transfers.
//!
//! A fixed-width worker pool drains the job list: spawn up to N
//! transfers, await the first completion, top the pool back up. On the
//! first failure no new transfer is started, but everything already in
//! flight is drained to completion before the error surfaces — a
//! registry entry must never reference a storage object whose upload
//! never finished, or vice versa.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use statichost_protocol::types::{Asset, StorageRef, UploadUrl};

use crate::client::DeployClient;
use crate::error::DeployError;
use crate::types::DeployEvent;

/// Which backend a job's bytes go to.
pub(crate) enum UploadTarget {
    /// Block storage via a pre-granted one-time URL.
    Block { url: UploadUrl },
    /// Edge blob store via its own upload endpoint.
    Cdn,
}

/// One file transfer.
pub(crate) struct UploadJob {
    pub local_path: PathBuf,
    pub url_path: String,
    pub content_type: &'static str,
    pub target: UploadTarget,
}

/// Runs all jobs with at most `width` transfers in flight.
///
/// Returns the accumulated assets (stamped with `deployment_id`) once
/// every transfer has succeeded.
pub(crate) async fn run_uploads<C>(
    client: &Arc<C>,
    deployment_id: &str,
    jobs: Vec<UploadJob>,
    width: usize,
    cancel: &CancellationToken,
    events_tx: &mpsc::Sender<DeployEvent>,
) -> Result<Vec<Asset>, DeployError>
where
    C: DeployClient + 'static,
{
    let width = width.max(1);
    let total = jobs.len();
    let mut pending = jobs.into_iter();
    let mut join_set: JoinSet<Result<Asset, DeployError>> = JoinSet::new();
    let mut assets = Vec::with_capacity(total);
    let mut first_error: Option<DeployError> = None;

    loop {
        if cancel.is_cancelled() && first_error.is_none() {
            first_error = Some(DeployError::Cancelled);
        }

        // Top the pool back up; stops permanently after the first failure.
        while first_error.is_none() && join_set.len() < width {
            let Some(job) = pending.next() else { break };
            let client = Arc::clone(client);
            let deployment_id = deployment_id.to_string();
            join_set.spawn(async move { upload_one(&*client, &deployment_id, job).await });
        }

        match join_set.join_next().await {
            Some(Ok(Ok(asset))) => {
                debug!(path = %asset.path, "transfer complete");
                assets.push(asset);
                if total > 0 {
                    let progress = 0.1 + (assets.len() as f64 / total as f64) * 0.75;
                    // Best-effort: progress never blocks the pool.
                    let _ = events_tx.try_send(DeployEvent::Progress {
                        progress,
                        status: format!("Uploaded {}/{total} files", assets.len()),
                    });
                }
            }
            Some(Ok(Err(e))) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Some(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(DeployError::Upload(format!("task join error: {e}")));
                }
            }
            // Pool empty: either all jobs are done or draining finished.
            None => break,
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(assets),
    }
}

async fn upload_one<C: DeployClient>(
    client: &C,
    deployment_id: &str,
    job: UploadJob,
) -> Result<Asset, DeployError> {
    let data = tokio::fs::read(&job.local_path).await?;

    let storage_ref = match job.target {
        UploadTarget::Block { url } => {
            let storage_id = client.upload_block(&url, data).await?;
            StorageRef::Blob { storage_id }
        }
        UploadTarget::Cdn => {
            let blob_id = client.upload_cdn_blob(data, job.content_type).await?;
            StorageRef::Cdn { blob_id }
        }
    };

    Ok(Asset {
        path: job.url_path,
        content_type: job.content_type.to_string(),
        storage_ref,
        deployment_id: deployment_id.to_string(),
    })
}
