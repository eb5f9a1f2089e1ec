//! Document-store interface and the in-memory implementation.
//!
//! The host platform provides the actual collections (`staticAssets`
//! indexed by path and deployment id, `deploymentInfo` singleton).
//! [`AssetStore`] captures exactly the operations the registry needs;
//! per-call atomicity is the store's contract, not the registry's.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

use statichost_protocol::types::{Asset, DeploymentInfo};

use crate::RegistryError;

/// A boxed future returned by store trait methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RegistryError>> + Send + 'a>>;

/// Operations the registry requires of the document store.
pub trait AssetStore: Send + Sync {
    /// Point lookup by the unique path index. Exact match only.
    fn get(&self, path: &str) -> StoreFuture<'_, Option<Asset>>;

    /// Atomically replaces any existing row at `asset.path` with
    /// `asset` (delete + insert in one step), returning the old row.
    /// Readers never observe zero or two rows for the path.
    fn replace(&self, asset: Asset) -> StoreFuture<'_, Option<Asset>>;

    /// Deletes every row whose deployment id differs from
    /// `current_deployment_id` and returns the removed rows.
    fn remove_stale(&self, current_deployment_id: &str) -> StoreFuture<'_, Vec<Asset>>;

    /// Enumerates rows in insertion order, up to `limit`.
    fn scan(&self, limit: usize) -> StoreFuture<'_, Vec<Asset>>;

    /// Reads the deployment pointer singleton.
    fn pointer(&self) -> StoreFuture<'_, Option<DeploymentInfo>>;

    /// Upserts the deployment pointer singleton.
    fn set_pointer(&self, info: DeploymentInfo) -> StoreFuture<'_, ()>;
}

#[derive(Default)]
struct StoreState {
    rows: HashMap<String, Asset>,
    /// Paths in insertion order; a replace moves the path to the back.
    order: Vec<String>,
    pointer: Option<DeploymentInfo>,
}

/// In-memory [`AssetStore`].
///
/// A single write lock scopes `replace` and `remove_stale`, standing
/// in for the platform's per-call atomicity.
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows (test helper).
    pub async fn row_count(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

impl AssetStore for MemoryAssetStore {
    fn get(&self, path: &str) -> StoreFuture<'_, Option<Asset>> {
        let path = path.to_string();
        Box::pin(async move { Ok(self.state.read().await.rows.get(&path).cloned()) })
    }

    fn replace(&self, asset: Asset) -> StoreFuture<'_, Option<Asset>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let old = state.rows.insert(asset.path.clone(), asset.clone());
            if old.is_some() {
                state.order.retain(|p| p != &asset.path);
            }
            state.order.push(asset.path);
            Ok(old)
        })
    }

    fn remove_stale(&self, current_deployment_id: &str) -> StoreFuture<'_, Vec<Asset>> {
        let current = current_deployment_id.to_string();
        Box::pin(async move {
            let mut state = self.state.write().await;
            let stale: Vec<String> = state
                .rows
                .values()
                .filter(|a| a.deployment_id != current)
                .map(|a| a.path.clone())
                .collect();

            let mut removed = Vec::with_capacity(stale.len());
            for path in &stale {
                if let Some(asset) = state.rows.remove(path) {
                    removed.push(asset);
                }
            }
            state.order.retain(|p| !stale.contains(p));
            Ok(removed)
        })
    }

    fn scan(&self, limit: usize) -> StoreFuture<'_, Vec<Asset>> {
        Box::pin(async move {
            let state = self.state.read().await;
            Ok(state
                .order
                .iter()
                .take(limit)
                .filter_map(|p| state.rows.get(p).cloned())
                .collect())
        })
    }

    fn pointer(&self) -> StoreFuture<'_, Option<DeploymentInfo>> {
        Box::pin(async move { Ok(self.state.read().await.pointer.clone()) })
    }

    fn set_pointer(&self, info: DeploymentInfo) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.state.write().await.pointer = Some(info);
            Ok(())
        })
    }
}
