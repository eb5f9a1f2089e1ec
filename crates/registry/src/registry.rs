//! Registry operations over the document store.

use chrono::Utc;
use tracing::debug;

use statichost_protocol::types::{Asset, DeploymentInfo, StorageRef};

use crate::RegistryError;
use crate::store::AssetStore;

/// Default cap for diagnostic enumeration.
const DEFAULT_LIST_LIMIT: usize = 100;

/// Storage references released by a sweep, partitioned by backend.
///
/// The caller owns physical deletion; the registry only guarantees the
/// rows are gone and the refs are no longer reachable by lookups.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub released_blob_refs: Vec<String>,
    pub released_cdn_refs: Vec<String>,
}

impl SweepOutcome {
    /// Number of registry rows the sweep removed.
    pub fn deleted(&self) -> u64 {
        (self.released_blob_refs.len() + self.released_cdn_refs.len()) as u64
    }
}

/// The path-keyed asset registry.
pub struct AssetRegistry<S> {
    store: S,
}

impl<S: AssetStore> AssetRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Exact-match point lookup. Callers implement fallback policy.
    pub async fn lookup(&self, path: &str) -> Result<Option<Asset>, RegistryError> {
        self.store.get(path).await
    }

    /// Replaces any existing asset at `path`, returning the old
    /// storage reference so the caller can release it.
    pub async fn upsert(
        &self,
        path: &str,
        storage_ref: StorageRef,
        content_type: &str,
        deployment_id: &str,
    ) -> Result<Option<StorageRef>, RegistryError> {
        let old = self
            .store
            .replace(Asset {
                path: path.to_string(),
                content_type: content_type.to_string(),
                storage_ref,
                deployment_id: deployment_id.to_string(),
            })
            .await?;
        Ok(old.map(|a| a.storage_ref))
    }

    /// Applies [`upsert`](Self::upsert) per entry in one round trip.
    ///
    /// Each path replace is individually atomic; the batch is not one
    /// cross-path transaction. Returns every replaced storage
    /// reference for release.
    pub async fn batch_upsert(&self, entries: Vec<Asset>) -> Result<Vec<StorageRef>, RegistryError> {
        let mut replaced = Vec::new();
        for entry in entries {
            if let Some(old) = self.store.replace(entry).await? {
                replaced.push(old.storage_ref);
            }
        }
        Ok(replaced)
    }

    /// Deletes every asset not stamped with `current_deployment_id`
    /// and returns the released references partitioned by backend.
    ///
    /// Idempotent: a second call with the same id releases nothing.
    pub async fn sweep(&self, current_deployment_id: &str) -> Result<SweepOutcome, RegistryError> {
        let removed = self.store.remove_stale(current_deployment_id).await?;

        let mut outcome = SweepOutcome::default();
        for asset in removed {
            match asset.storage_ref {
                StorageRef::Blob { storage_id } => outcome.released_blob_refs.push(storage_id),
                StorageRef::Cdn { blob_id } => outcome.released_cdn_refs.push(blob_id),
            }
        }

        debug!(
            current = %current_deployment_id,
            blob = outcome.released_blob_refs.len(),
            cdn = outcome.released_cdn_refs.len(),
            "sweep complete"
        );
        Ok(outcome)
    }

    /// Diagnostic enumeration in insertion order, capped at 100 by default.
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<Asset>, RegistryError> {
        self.store.scan(limit.unwrap_or(DEFAULT_LIST_LIMIT)).await
    }

    /// Reads the deployment pointer.
    pub async fn current_deployment(&self) -> Result<Option<DeploymentInfo>, RegistryError> {
        self.store.pointer().await
    }

    /// Advances the deployment pointer to `deployment_id`.
    ///
    /// Only the finalize step of a deploy calls this, after every
    /// registration for the generation has committed.
    pub async fn advance_pointer(
        &self,
        deployment_id: &str,
    ) -> Result<DeploymentInfo, RegistryError> {
        let info = DeploymentInfo {
            current_deployment_id: deployment_id.to_string(),
            deployed_at: Utc::now(),
        };
        self.store.set_pointer(info.clone()).await?;
        Ok(info)
    }
}
