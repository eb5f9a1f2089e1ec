use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use statichost_protocol::types::UploadUrl;

use crate::digest::content_digest;
use crate::{StorageError, StoreFuture};

/// Platform block storage.
///
/// Uploads happen against one-time URLs granted in batches; the
/// registry is bypassed entirely for the byte transfer itself.
pub trait BlockStore: Send + Sync {
    /// Grants `count` one-time upload URLs in a single round trip.
    fn generate_upload_urls(&self, count: u32) -> StoreFuture<'_, Vec<UploadUrl>>;

    /// Uploads raw bytes against a granted token, consuming it.
    /// Returns the storage id of the stored object.
    fn put(&self, token: &str, data: Vec<u8>) -> StoreFuture<'_, String>;

    /// Reads a whole object by storage id.
    fn read(&self, storage_id: &str) -> StoreFuture<'_, Vec<u8>>;

    /// Deletes an object by storage id.
    fn delete(&self, storage_id: &str) -> StoreFuture<'_, ()>;
}

#[derive(Default)]
struct BlockState {
    /// Tokens granted but not yet consumed.
    pending_tokens: HashSet<String>,
    objects: HashMap<String, Vec<u8>>,
}

/// In-memory [`BlockStore`] for local development and tests.
///
/// Storage ids are keyed by grant token and content digest: two
/// uploads of identical bytes get distinct ids, so a sweep never frees
/// bytes a live asset still references.
#[derive(Clone, Default)]
pub struct MemoryBlockStore {
    state: Arc<RwLock<BlockState>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects (test helper).
    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    /// Returns `true` if `storage_id` is resolvable (test helper).
    pub async fn contains(&self, storage_id: &str) -> bool {
        self.state.read().await.objects.contains_key(storage_id)
    }
}

impl BlockStore for MemoryBlockStore {
    fn generate_upload_urls(&self, count: u32) -> StoreFuture<'_, Vec<UploadUrl>> {
        Box::pin(async move {
            let mut state = self.state.write().await;
            let mut urls = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let token = Uuid::new_v4().to_string();
                state.pending_tokens.insert(token.clone());
                urls.push(UploadUrl {
                    url: format!("memory://block/{token}"),
                    token,
                });
            }
            Ok(urls)
        })
    }

    fn put(&self, token: &str, data: Vec<u8>) -> StoreFuture<'_, String> {
        let token = token.to_string();
        Box::pin(async move {
            let mut state = self.state.write().await;
            if !state.pending_tokens.remove(&token) {
                return Err(StorageError::UnknownToken(token));
            }
            let mut keyed = token.into_bytes();
            keyed.extend_from_slice(&data);
            let storage_id = format!("st_{}", &content_digest(&keyed)[..32]);
            state.objects.insert(storage_id.clone(), data);
            Ok(storage_id)
        })
    }

    fn read(&self, storage_id: &str) -> StoreFuture<'_, Vec<u8>> {
        let storage_id = storage_id.to_string();
        Box::pin(async move {
            let state = self.state.read().await;
            state
                .objects
                .get(&storage_id)
                .cloned()
                .ok_or(StorageError::NotFound(storage_id))
        })
    }

    fn delete(&self, storage_id: &str) -> StoreFuture<'_, ()> {
        let storage_id = storage_id.to_string();
        Box::pin(async move {
            let mut state = self.state.write().await;
            if state.objects.remove(&storage_id).is_none() {
                return Err(StorageError::NotFound(storage_id));
            }
            Ok(())
        })
    }
}
