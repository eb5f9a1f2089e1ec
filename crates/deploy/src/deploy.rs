//! Deploy orchestrator.
//!
//! Drives one deploy invocation end to end with an all-or-nothing
//! observable outcome: the new generation is fully registered and
//! servable before anything from the old generation is released.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::client::DeployClient;
use crate::content_type::{content_type_for, is_html};
use crate::error::DeployError;
use crate::scanner::scan_site;
use crate::types::{DeployEvent, DeployOptions, DeployReport};
use crate::uploader::{UploadJob, UploadTarget, run_uploads};

/// Orchestrates one site deployment.
pub struct DeployOrchestrator {
    events_tx: mpsc::Sender<DeployEvent>,
    events_rx: Option<mpsc::Receiver<DeployEvent>>,
    cancel: CancellationToken,
}

impl Default for DeployOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeployOrchestrator {
    /// Creates a new orchestrator.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DeployEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this deployment.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the full deploy pipeline.
    ///
    /// Progress events are sent via the channel from [`take_events`].
    /// The pipeline:
    /// 1. Scan files (0.0–0.05)
    /// 2. Request upload URL batch (0.05–0.1)
    /// 3. Upload with bounded parallelism (0.1–0.85)
    /// 4. Register the whole set (0.85–0.9)
    /// 5. Garbage-collect the prior generation (0.9–1.0)
    pub async fn deploy<C>(
        &self,
        client: &Arc<C>,
        options: &DeployOptions,
    ) -> Result<DeployReport, DeployError>
    where
        C: DeployClient + 'static,
    {
        match self.run(client, options).await {
            Ok(report) => {
                let _ = self
                    .events_tx
                    .send(DeployEvent::Completed {
                        deployment_id: report.deployment_id.clone(),
                    })
                    .await;
                info!(
                    deployment = %report.deployment_id,
                    uploaded = report.uploaded,
                    swept = report.swept,
                    "deploy completed"
                );
                Ok(report)
            }
            Err(e) => {
                let err_msg = e.to_string();
                let _ = self
                    .events_tx
                    .send(DeployEvent::Failed {
                        error: err_msg.clone(),
                    })
                    .await;
                error!(error = %err_msg, "deploy failed");
                Err(e)
            }
        }
    }

    async fn run<C>(
        &self,
        client: &Arc<C>,
        options: &DeployOptions,
    ) -> Result<DeployReport, DeployError>
    where
        C: DeployClient + 'static,
    {
        let deployment_id = Uuid::new_v4().to_string();

        // 1. Scan.
        self.emit_progress(0.0, "Scanning site...");
        self.check_cancelled()?;

        let (files, total_size) = scan_site(&options.site_dir)?;
        info!(
            deployment = %deployment_id,
            files = files.len(),
            total_bytes = total_size,
            "scan complete"
        );

        // An empty file set deploys nothing and sweeps nothing; the
        // previous generation stays live.
        if files.is_empty() {
            return Ok(DeployReport {
                deployment_id,
                uploaded: 0,
                swept: 0,
                cdn_blobs_deleted: 0,
            });
        }

        // 2. Partition and request the upload URL batch.
        self.emit_progress(0.05, "Requesting upload grants...");
        self.check_cancelled()?;

        let mut jobs = Vec::with_capacity(files.len());
        let mut block_count: u32 = 0;
        for file in &files {
            let content_type = content_type_for(&file.relative_path);
            let to_cdn = options.cdn_enabled && !is_html(content_type);
            if !to_cdn {
                block_count += 1;
            }
            jobs.push((file, content_type, to_cdn));
        }

        // One round trip, sized to the block group.
        let urls = client.generate_upload_urls(block_count).await?;
        if urls.len() != block_count as usize {
            return Err(DeployError::Backend(format!(
                "requested {block_count} upload urls, got {}",
                urls.len()
            )));
        }

        let mut url_iter = urls.into_iter();
        let mut upload_jobs = Vec::with_capacity(jobs.len());
        for (file, content_type, to_cdn) in jobs {
            let target = if to_cdn {
                UploadTarget::Cdn
            } else {
                match url_iter.next() {
                    Some(url) => UploadTarget::Block { url },
                    None => {
                        return Err(DeployError::Backend("upload url batch undersized".into()));
                    }
                }
            };
            upload_jobs.push(UploadJob {
                local_path: options.site_dir.join(&file.relative_path),
                url_path: file.url_path.clone(),
                content_type,
                target,
            });
        }

        // 3. Upload.
        self.emit_progress(0.1, "Uploading files...");
        let assets = run_uploads(
            client,
            &deployment_id,
            upload_jobs,
            options.concurrency,
            &self.cancel,
            &self.events_tx,
        )
        .await?;
        let uploaded = assets.len();

        // 4. Register. Block entries flush as one batch; CDN entries
        // use a different identifier field and flush individually.
        self.emit_progress(0.85, "Registering assets...");
        self.check_cancelled()?;

        let (cdn_assets, block_assets): (Vec<_>, Vec<_>) =
            assets.into_iter().partition(|a| a.storage_ref.is_cdn());

        if !block_assets.is_empty() {
            client.record_assets(block_assets).await?;
        }
        for asset in cdn_assets {
            client.record_asset(asset).await?;
        }

        // 5. Finalize. Registration for the whole set has committed,
        // so the stale generation can be swept and the pointer
        // advanced. A crash before this point leaves the old
        // generation fully intact and servable.
        self.emit_progress(0.9, "Collecting stale assets...");
        let gc = client.garbage_collect(&deployment_id).await?;

        let mut cdn_blobs_deleted = 0;
        if !gc.blob_ids.is_empty() {
            match client.delete_cdn_blobs(gc.blob_ids.clone()).await {
                Ok(deleted) => cdn_blobs_deleted = deleted,
                Err(e) => {
                    // The swept blobs are already unreferenced; leak, warn, move on.
                    warn!(error = %e, blobs = gc.blob_ids.len(), "failed to delete cdn blobs");
                }
            }
        }

        self.emit_progress(1.0, "Deploy complete");

        Ok(DeployReport {
            deployment_id,
            uploaded,
            swept: gc.deleted,
            cdn_blobs_deleted,
        })
    }

    fn check_cancelled(&self) -> Result<(), DeployError> {
        if self.cancel.is_cancelled() {
            Err(DeployError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Best-effort progress emit; a slow or absent consumer never
    /// stalls the pipeline.
    fn emit_progress(&self, progress: f64, status: &str) {
        let _ = self.events_tx.try_send(DeployEvent::Progress {
            progress,
            status: status.to_string(),
        });
    }
}
