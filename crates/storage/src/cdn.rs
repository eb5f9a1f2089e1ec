use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::digest::content_digest;
use crate::{StorageError, StoreFuture};

/// Edge blob store, optimized for public delivery.
///
/// No batch upload primitive: each file is uploaded individually. The
/// serving path reaches blobs via redirect, never by streaming through
/// the resolver.
pub trait CdnStore: Send + Sync {
    /// Uploads raw bytes with a content type, returning the blob id.
    fn upload(&self, data: Vec<u8>, content_type: &str) -> StoreFuture<'_, String>;

    /// Deletes a blob by id.
    fn delete(&self, blob_id: &str) -> StoreFuture<'_, ()>;
}

struct CdnBlob {
    content_type: String,
    data: Vec<u8>,
}

/// In-memory [`CdnStore`] for local development and tests.
#[derive(Clone, Default)]
pub struct MemoryCdnStore {
    blobs: Arc<RwLock<HashMap<String, CdnBlob>>>,
}

impl MemoryCdnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs (test helper).
    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns `true` if `blob_id` is resolvable (test helper).
    pub async fn contains(&self, blob_id: &str) -> bool {
        self.blobs.read().await.contains_key(blob_id)
    }

    /// Returns the stored content type for `blob_id` (test helper).
    pub async fn content_type(&self, blob_id: &str) -> Option<String> {
        self.blobs
            .read()
            .await
            .get(blob_id)
            .map(|b| b.content_type.clone())
    }
}

impl CdnStore for MemoryCdnStore {
    fn upload(&self, data: Vec<u8>, content_type: &str) -> StoreFuture<'_, String> {
        let content_type = content_type.to_string();
        Box::pin(async move {
            // Nonce keeps ids unique across identical uploads, same as
            // the block store's grant-token keying.
            let mut keyed = Uuid::new_v4().to_string().into_bytes();
            keyed.extend_from_slice(&data);
            let blob_id = format!("cdn_{}", &content_digest(&keyed)[..32]);

            self.blobs
                .write()
                .await
                .insert(blob_id.clone(), CdnBlob { content_type, data });
            Ok(blob_id)
        })
    }

    fn delete(&self, blob_id: &str) -> StoreFuture<'_, ()> {
        let blob_id = blob_id.to_string();
        Box::pin(async move {
            let mut blobs = self.blobs.write().await;
            if blobs.remove(&blob_id).is_none() {
                return Err(StorageError::NotFound(blob_id));
            }
            Ok(())
        })
    }
}
